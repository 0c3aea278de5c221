use chrono::{DateTime, Local};

/// Lines of context echoed back in the template analysis.
const ERROR_CONTEXT_LINES: usize = 10;

/// Footer appended to every model-written analysis.
pub fn metadata_footer(generated_at: DateTime<Local>) -> String {
    format!(
        "\n\n---\n**Analysis Metadata:**\n\
         - Analysis performed using AI-powered root cause detection\n\
         - Based on recent code changes and error context\n\
         - Recommendations are specific to .NET/C#/VB.NET applications\n\
         - Generated on: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Generic .NET troubleshooting guide used when the model can't be reached.
pub fn template_analysis(context: &str) -> String {
    let error_text = context
        .split('\n')
        .take(ERROR_CONTEXT_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"
# Root Cause Analysis (.NET Focus)

## Error Summary
Based on the provided error message and Azure DevOps repository code analysis:

**Error Context:**
{error_text}

## Potential Root Causes
1. **Primary Cause**: [Analysis based on error patterns]
   - Check for null reference exceptions in the code
   - Verify object initialization before usage
   - Review method parameters and return values

2. **Secondary Causes**: [Other possible contributing factors]
   - Missing NuGet packages or assembly references
   - Configuration file issues (web.config, appsettings.json)
   - Database connection or Entity Framework issues
   - Dependency injection container misconfigurations

## Code Analysis (.NET Specific)
- **Files Examined**: Recently changed C#/VB.NET files and configuration files
- **Framework Patterns**: ASP.NET, Entity Framework, dependency injection patterns
- **Common Issues**:
  - Null reference exceptions
  - Configuration binding issues
  - Object lifecycle problems
  - Missing error handling

## Recommended Solutions

### 1. Immediate Fixes
```csharp
// Example: Add null checks
if (someObject != null)
{{
    // Your code here
}}

// Example: Initialize objects properly
var myObject = new MyClass();

// Example: Use safe navigation
var result = myObject?.SomeProperty?.SomeMethod();
```

### 2. Long-term Improvements
- Implement proper error handling middleware
- Add comprehensive logging (Serilog, NLog, or built-in ILogger)
- Use dependency injection best practices
- Implement proper configuration validation
- Add unit tests with proper mocking

## .NET Best Practices
- **Null Safety**: Use nullable reference types (C# 8.0+)
- **Configuration**: Use IOptions pattern for strongly-typed configuration
- **Logging**: Implement structured logging
- **Exception Handling**: Use global exception handling middleware
- **Testing**: Add unit tests with proper mocking

## Configuration Checks
```json
// appsettings.json example
{{
  "ConnectionStrings": {{
    "DefaultConnection": "Server=...;Database=...;Trusted_Connection=true;"
  }},
  "Logging": {{
    "LogLevel": {{
      "Default": "Information"
    }}
  }}
}}
```

## Additional Recommendations
- Review NuGet package versions for compatibility
- Check .NET Framework/Core version compatibility
- Validate database migration status
- Ensure proper error handling in controllers/services
- Consider implementing health checks

---
**Note:** This analysis was generated using fallback templates. For more detailed AI-powered analysis, ensure OpenAI credentials are properly configured.
"#
    )
}
