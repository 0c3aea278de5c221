//! Canned inputs for trying the analyzer out

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SampleRepo {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

pub const SAMPLE_ERRORS: &[&str] = &[
    "System.NullReferenceException: Object reference not set to an instance of an object.",
    "System.ArgumentNullException: Value cannot be null.",
    "System.Data.SqlClient.SqlException: A network-related or instance-specific error occurred while establishing a connection to SQL Server.",
    "System.IO.FileNotFoundException: Could not load file or assembly 'Newtonsoft.Json, Version=13.0.0.0' or one of its dependencies.",
    "System.Security.SecurityException: Request for the permission of type 'System.Security.Permissions.FileIOPermission' failed.",
    "System.Web.UI.ViewStateException: Invalid viewstate. Client IP: 192.168.1.100 User-Agent: Mozilla/5.0",
    "System.Web.Services.Protocols.SoapException: Server was unable to process request. ---> System.ArgumentException: Invalid billing account number.",
    "Microsoft.AspNetCore.Http.BadHttpRequestException: Reading the request body timed out due to data arriving too slowly.",
    "System.Text.Json.JsonException: The JSON value could not be converted to System.DateTime.",
];

pub const SAMPLE_REPOS: &[SampleRepo] = &[
    SampleRepo {
        name: "Biller Search API",
        url: "https://dev.azure.com/invoicecloud/Biller/_git/BillerSearchAPI",
        description: "Quick Find",
    },
    SampleRepo {
        name: "MyIIS",
        url: "https://dev.azure.com/invoicecloud/Src/_git/MyIIS",
        description: "Shared repo",
    },
    SampleRepo {
        name: "Biller Reporting Chat API",
        url: "https://dev.azure.com/invoicecloud/Biller/_git/BillerReportingChatAPI",
        description: "AI reporting",
    },
    SampleRepo {
        name: "Biller Reporting API",
        url: "https://dev.azure.com/invoicecloud/Biller/_git/BillerReportingAPI",
        description: "GraphQL schema and resolvers",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devops::parse_repo_url;

    #[test]
    fn test_sample_counts() {
        assert_eq!(SAMPLE_ERRORS.len(), 9);
        assert_eq!(SAMPLE_REPOS.len(), 4);
    }

    #[test]
    fn test_sample_repos_parse() {
        for repo in SAMPLE_REPOS {
            assert!(parse_repo_url(repo.url).is_some(), "{}", repo.url);
        }
    }
}
