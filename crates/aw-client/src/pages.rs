//! Paginated response shapes for Graph and ARM listings.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// One page of a paginated listing.
pub(crate) trait Page<T>: DeserializeOwned {
    fn into_parts(self) -> (Vec<T>, Option<String>);
}

/// Microsoft Graph page wrapper.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub(crate) struct ODataPage<T> {
    #[serde(default)]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

impl<T: DeserializeOwned> Page<T> for ODataPage<T> {
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.value, self.next_link)
    }
}

/// Azure Resource Manager page wrapper.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub(crate) struct ArmPage<T> {
    #[serde(default)]
    pub value: Vec<T>,
    #[serde(rename = "nextLink")]
    pub next_link: Option<String>,
}

impl<T: DeserializeOwned> Page<T> for ArmPage<T> {
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.value, self.next_link)
    }
}

#[cfg(test)]
mod tests {
    use aw_core::azure;

    use super::*;

    #[test]
    fn graph_page_with_next_link() {
        let page: ODataPage<azure::Application> = serde_json::from_str(
            r#"{
                "value": [{"id": "obj-1", "appId": "app-1", "displayName": "billing"}],
                "@odata.nextLink": "https://graph.microsoft.com/v1.0/applications?$skiptoken=x"
            }"#,
        )
        .unwrap();
        let (items, next) = page.into_parts();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].app_id, "app-1");
        assert!(next.unwrap().contains("skiptoken"));
    }

    #[test]
    fn graph_page_without_value_is_empty() {
        let page: ODataPage<azure::Application> = serde_json::from_str("{}").unwrap();
        let (items, next) = page.into_parts();
        assert!(items.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn arm_page_with_next_link() {
        let page: ArmPage<azure::Subscription> = serde_json::from_str(
            r#"{
                "value": [{"id": "/subscriptions/s1", "subscriptionId": "s1", "displayName": "prod"}],
                "nextLink": "https://management.azure.com/subscriptions?$skiptoken=y"
            }"#,
        )
        .unwrap();
        let (items, next) = page.into_parts();
        assert_eq!(items[0].subscription_id, "s1");
        assert!(next.is_some());
    }
}
