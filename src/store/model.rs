use serde::Deserialize;
use serde_json::{Map, Value};

/// Response bodies the admin API is known to produce for a container.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum Envelope {
    Wrapped { data: Body },
    Bare(Body),
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum Body {
    Record {
        #[serde(rename = "_id", alias = "id", default)]
        id: Option<String>,
        sequence: Vec<Map<String, Value>>,
    },
    Items(Vec<Map<String, Value>>),
}
