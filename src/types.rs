use serde::{Deserialize, Serialize};
use std::fmt;

/// Countries the generator service can produce data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    AU,
    BR,
    CA,
    CH,
    DE,
    DK,
    ES,
    FI,
    FR,
    GB,
    IE,
    IN,
    IR,
    MX,
    NL,
    NO,
    NZ,
    RS,
    TR,
    UA,
    #[default]
    US,
}

impl Region {
    pub const ALL: [Region; 21] = [
        Region::AU,
        Region::BR,
        Region::CA,
        Region::CH,
        Region::DE,
        Region::DK,
        Region::ES,
        Region::FI,
        Region::FR,
        Region::GB,
        Region::IE,
        Region::IN,
        Region::IR,
        Region::MX,
        Region::NL,
        Region::NO,
        Region::NZ,
        Region::RS,
        Region::TR,
        Region::UA,
        Region::US,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Region::AU => "AU",
            Region::BR => "BR",
            Region::CA => "CA",
            Region::CH => "CH",
            Region::DE => "DE",
            Region::DK => "DK",
            Region::ES => "ES",
            Region::FI => "FI",
            Region::FR => "FR",
            Region::GB => "GB",
            Region::IE => "IE",
            Region::IN => "IN",
            Region::IR => "IR",
            Region::MX => "MX",
            Region::NL => "NL",
            Region::NO => "NO",
            Region::NZ => "NZ",
            Region::RS => "RS",
            Region::TR => "TR",
            Region::UA => "UA",
            Region::US => "US",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::AU => "Australia",
            Region::BR => "Brazil",
            Region::CA => "Canada",
            Region::CH => "Switzerland",
            Region::DE => "Germany",
            Region::DK => "Denmark",
            Region::ES => "Spain",
            Region::FI => "Finland",
            Region::FR => "France",
            Region::GB => "United Kingdom",
            Region::IE => "Ireland",
            Region::IN => "India",
            Region::IR => "Iran",
            Region::MX => "Mexico",
            Region::NL => "Netherlands",
            Region::NO => "Norway",
            Region::NZ => "New Zealand",
            Region::RS => "Serbia",
            Region::TR => "Turkey",
            Region::UA => "Ukraine",
            Region::US => "United States",
        }
    }

    pub fn from_code(code: &str) -> Option<Region> {
        Region::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn index(&self) -> usize {
        Region::ALL.iter().position(|r| r == self).unwrap_or(0)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::from_code(s).ok_or_else(|| format!("unsupported region '{}'", s))
    }
}

/// Upper bound of the error-amount slider.
pub const MAX_ERROR_AMOUNT: u32 = 1000;

/// Inputs that identify one generated data set. Two fetches with equal
/// parameters belong to the same result set and page onto each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GenerationParameters {
    pub region: Region,
    pub error_amount: u32,
    pub seed: u64,
}

impl GenerationParameters {
    pub fn new(region: Region, error_amount: u32, seed: u64) -> Self {
        Self {
            region,
            error_amount: error_amount.min(MAX_ERROR_AMOUNT),
            seed,
        }
    }

    pub fn with_region(self, region: Region) -> Self {
        Self { region, ..self }
    }

    pub fn with_error_amount(self, error_amount: u32) -> Self {
        Self::new(self.region, error_amount, self.seed)
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }
}

/// One generated user, as returned by `/generate-data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "randomIdentifier")]
    pub identifier: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Access/refresh pair handed out by `/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a `/auth/refresh-token` response. Servers that rotate refresh
/// tokens send a new one alongside.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}
