use getset::Getters;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct Artist {
    href: String,
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    uri: String,
}
