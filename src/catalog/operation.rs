//! Operation identifiers.
//!
//! The identifier set is closed: every provider API action the engine can
//! orchestrate is a variant here. Parsing from wire strings is total over
//! this set and fails loudly on anything else; there is deliberately no
//! fuzzy matching and no default variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A discrete provider API action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum OperationId {
    Authenticate,
    GetProjects,
    GetTestCases,
    GetTestCase,
    GetTestCycles,
    GetTestExecutions,
    GetAttachments,
    DownloadAttachment,
    CreateTestCase,
    UpdateTestCase,
    CreateTestCycle,
    CreateTestExecution,
    UploadAttachment,
    VerifyMigration,
}

/// Error for strings outside the closed operation set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown operation type: {0:?}")]
pub struct UnknownOperationType(pub String);

impl OperationId {
    /// All identifiers, in canonical (lexicographic wire-name) order.
    pub const ALL: [OperationId; 14] = [
        OperationId::Authenticate,
        OperationId::CreateTestCase,
        OperationId::CreateTestCycle,
        OperationId::CreateTestExecution,
        OperationId::DownloadAttachment,
        OperationId::GetAttachments,
        OperationId::GetProjects,
        OperationId::GetTestCase,
        OperationId::GetTestCases,
        OperationId::GetTestCycles,
        OperationId::GetTestExecutions,
        OperationId::UpdateTestCase,
        OperationId::UploadAttachment,
        OperationId::VerifyMigration,
    ];

    /// The canonical wire name, as provider contracts spell it.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationId::Authenticate => "AUTHENTICATE",
            OperationId::GetProjects => "GET_PROJECTS",
            OperationId::GetTestCases => "GET_TEST_CASES",
            OperationId::GetTestCase => "GET_TEST_CASE",
            OperationId::GetTestCycles => "GET_TEST_CYCLES",
            OperationId::GetTestExecutions => "GET_TEST_EXECUTIONS",
            OperationId::GetAttachments => "GET_ATTACHMENTS",
            OperationId::DownloadAttachment => "DOWNLOAD_ATTACHMENT",
            OperationId::CreateTestCase => "CREATE_TEST_CASE",
            OperationId::UpdateTestCase => "UPDATE_TEST_CASE",
            OperationId::CreateTestCycle => "CREATE_TEST_CYCLE",
            OperationId::CreateTestExecution => "CREATE_TEST_EXECUTION",
            OperationId::UploadAttachment => "UPLOAD_ATTACHMENT",
            OperationId::VerifyMigration => "VERIFY_MIGRATION",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationId {
    type Err = UnknownOperationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTHENTICATE" => Ok(OperationId::Authenticate),
            "GET_PROJECTS" => Ok(OperationId::GetProjects),
            "GET_TEST_CASES" => Ok(OperationId::GetTestCases),
            "GET_TEST_CASE" => Ok(OperationId::GetTestCase),
            "GET_TEST_CYCLES" => Ok(OperationId::GetTestCycles),
            "GET_TEST_EXECUTIONS" => Ok(OperationId::GetTestExecutions),
            "GET_ATTACHMENTS" => Ok(OperationId::GetAttachments),
            "DOWNLOAD_ATTACHMENT" => Ok(OperationId::DownloadAttachment),
            "CREATE_TEST_CASE" => Ok(OperationId::CreateTestCase),
            "UPDATE_TEST_CASE" => Ok(OperationId::UpdateTestCase),
            "CREATE_TEST_CYCLE" => Ok(OperationId::CreateTestCycle),
            "CREATE_TEST_EXECUTION" => Ok(OperationId::CreateTestExecution),
            "UPLOAD_ATTACHMENT" => Ok(OperationId::UploadAttachment),
            "VERIFY_MIGRATION" => Ok(OperationId::VerifyMigration),
            other => Err(UnknownOperationType(other.to_string())),
        }
    }
}

impl TryFrom<String> for OperationId {
    type Error = UnknownOperationType;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OperationId> for String {
    fn from(id: OperationId) -> String {
        id.as_str().to_string()
    }
}
