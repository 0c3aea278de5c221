pub const FILE_SELECTION_SYSTEM: &str = "You are a code analysis expert that helps identify relevant files for error analysis. Return only a JSON array of file paths without any additional text.";

pub fn file_selection_prompt(error_message: &str, file_list: &str, max_files: usize) -> String {
    format!(
        r#"You are a code analysis expert. Analyze this specific error message and select the {max_files} most relevant files from the repository.

ERROR MESSAGE TO ANALYZE:
{error_message}

AVAILABLE FILES IN REPOSITORY:
{file_list}

ANALYSIS INSTRUCTIONS:
1. Look for files whose names contain keywords from the error message
2. If the error mentions specific classes, methods, or namespaces, find files likely to contain them
3. Consider the error type (e.g., NullReferenceException, SqlException) and find related files
4. Look for configuration files if the error seems configuration-related
5. Include entry points (Program.cs, Startup.cs) only if the error occurs during startup

IMPORTANT: Base your selection ONLY on the specific error message provided, not on generic .NET patterns.

Return ONLY a JSON array of the most relevant file paths:
["path/to/relevant/file1.cs", "path/to/relevant/file2.cs"]"#
    )
}

pub const ANALYSIS_SYSTEM: &str = "You are an expert .NET developer and error analysis specialist. Provide detailed, actionable root cause analysis for software errors. Focus on practical solutions and specific code fixes.";

pub fn analysis_prompt(context: &str) -> String {
    format!(
        r#"You are an expert .NET developer and error analysis specialist. Analyze the following error message and related code files to provide a comprehensive root cause analysis.

{context}

Please provide a detailed analysis following this structure:

# Root Cause Analysis

## Error Summary
Provide a clear, concise summary of what the error means and where it occurs.

## Root Cause Identification
1. **Primary Cause**: Identify the most likely root cause based on the error message and code
2. **Contributing Factors**: List any secondary issues that may have contributed
3. **Code Location**: Pinpoint the exact location and line where the problem occurs

## Code Analysis
- Analyze the specific code patterns that led to this error
- Identify any anti-patterns or problematic implementations
- Review variable initialization, null checks, and object lifecycle

## Immediate Fixes
Provide specific, actionable code changes to fix this error:
```csharp
// Example fix with actual code snippets
```

## Prevention Strategies
- Suggest coding practices to prevent similar errors
- Recommend additional validation or error handling
- Identify areas for refactoring or improvement

## Testing Recommendations
- Suggest specific test cases to verify the fix
- Recommend integration tests or scenarios to prevent regression

## Additional Considerations
- Performance implications of the fix
- Security considerations if applicable
- Compatibility with existing code

Focus on practical, implementable solutions specific to this error and codebase."#
    )
}

pub const STORY_SYSTEM: &str = r#"##User Story
You are a Product manager, create a user story based on the description given in the prompt

##Acceptance Criteria
You are a product manager and an engineer, create acceptance criteria based on the description given in the prompt
and include edge cases and if the story requires documentation, include that as part of the acceptance criteria

##Scenarios
As a QA engineer, list out all the testing scenarios using Gherkin format make sure to cover all acceptance criteria in the given story.
Include testing scenarios around documentation if it's part of the acceptance criteria.

##Include a story point estimate based on the following guide

##Story point = 1 when it requires Minimum Effort, typically 1-2 hours, and is a trivial task, well-understood, and straightforward to implement.
Also a minimal risk, no significant unknowns or dependencies.

##Story point = 2 when it requires Minimum Effort and half a day. Simple task with a few minor challenges or dependencies.
Low risk, but some minor uncertainties or dependencies to consider.

##Story point = 3 when it requires Mild Effort, typically 1-2 days. Low complexity tasks with multiple dependencies or some technical challenges.
Moderate risk, with some unknowns or potential roadblocks.

##Story point = 5 requires Moderate Effort, typically 2-4 days.
Moderately complex tasks with several interconnected components or dependencies and technical challenges.
Moderate risk, with potential roadblocks or major unknowns.

##Story point = 8 requires High Effort, typically 1 week.
Highly complex tasks with many dependencies, technical risks, or requiring a significant amount of time to implement.
High risk, with significant unknowns or potential roadblocks.

##Story point = 13 requires Maximum Effort, typically 1-2 weeks.
Extremely complex task with numerous intricate components or dependencies. Imperative to break down into smaller, more manageable pieces before implementation.
High risk, with major unknowns or potential roadblocks.

##Investment Layer
Determine and select only one investment layer from the order below. Select the first one you encounter based on the Strategic Imperative and Example Work.
The Layer, Strategic Imperative, and Example Work are separated by pipes. Use the second and third values to determine the first.

##Layer Examples
Layer|Strategic Imperative|Example Work
Regulatory Investment|Required for compliance with regulatory requirements and standards|PCI (Environment Segregation), SOC, AppSec, Penetration Testing
Non-Discretionary Technical Upkeep|Required technology upkeep items (such as end-of-life), including business critical items needed to meet a required business SLA|.NET EOL, Batch Queue Automation, Infrastructure Patching
Product Support & Escalations|Break/fix & defect remediation issues, including escalations from the Customer Success team|Go Live Issues, Integrations, Implementations, Post-Go-Live Escalations
Customer Commitments|Investment required to deliver on committed client financial implications, including contractual commitments|Billing Enhancements, Contractual Commitments, Churn / Accommodations
New Revenue|Investment to deliver incremental value within existing products|Limit Increases, Add-On Fees, Loyalty Programs
Major Enhancements|Investment to deliver material value within existing products|SSO Phase II, Payment Plans Phase I, Payment Analytics
Technology Roadmap|Investment into the technology roadmap, including code & technical debt reduction or consolidation of platforms|Core Platform Migration, Multi-Region Model, DR
Innovation / Discovery|Investment in discovery & innovation activities that seek to identify future value streams|Generative AI Research

##Release Summary
Include a deployment release summary about this item

##Deployment Checks
Add some useful deployment check scenarios related to this item"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_selection_prompt_embeds_inputs() {
        let prompt = file_selection_prompt("NullReferenceException in OrderService", "- src/OrderService.cs", 7);
        assert!(prompt.contains("select the 7 most relevant files"));
        assert!(prompt.contains("NullReferenceException in OrderService"));
        assert!(prompt.contains("- src/OrderService.cs"));
        assert!(prompt.ends_with(r#"["path/to/relevant/file1.cs", "path/to/relevant/file2.cs"]"#));
    }

    #[test]
    fn test_analysis_prompt_wraps_context() {
        let prompt = analysis_prompt("ERROR MESSAGE:\nboom");
        assert!(prompt.contains("ERROR MESSAGE:\nboom"));
        assert!(prompt.contains("## Root Cause Identification"));
    }

    #[test]
    fn test_story_prompt_sections() {
        for section in ["##User Story", "##Acceptance Criteria", "##Scenarios", "##Release Summary"] {
            assert!(STORY_SYSTEM.contains(section));
        }
    }
}
