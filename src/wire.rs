use serde::Deserialize;

/// JSON body returned by the SQL endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub data: Option<Vec<Vec<serde_json::Value>>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default, rename = "execution-time")]
    pub execution_time: Option<u64>,
    #[serde(default, rename = "rows-affected")]
    pub rows_affected: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    Fields {
        #[serde(default)]
        fields: Vec<Field>,
    },
    Bare(Vec<Field>),
}

impl Schema {
    pub fn into_fields(self) -> Vec<Field> {
        match self {
            Self::Fields { fields } | Self::Bare(fields) => fields,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, rename = "base-type")]
    pub base_type: Option<String>,
}
