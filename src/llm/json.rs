use serde::de::DeserializeOwned;


/// Returns the outermost `{ ... }` span of a model reply, tolerating code
/// fences and prose around it.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}


pub fn parse_json_reply<T: DeserializeOwned>(response: &str) -> Result<T, serde_json::Error> {
    let payload = extract_json_object(response).unwrap_or(response);
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Reply {
        intent: String,
    }

    #[test]
    fn test_plain_object() {
        let reply: Reply = parse_json_reply(r#"{"intent": "news"}"#).unwrap();
        assert_eq!(reply.intent, "news");
    }

    #[test]
    fn test_fenced_object() {
        let raw = "Sure! Here it is:\n```json\n{\"intent\": \"academic\"}\n```\n";
        assert_eq!(extract_json_object(raw), Some("{\"intent\": \"academic\"}"));
        let reply: Reply = parse_json_reply(raw).unwrap();
        assert_eq!(reply.intent, "academic");
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
        assert!(parse_json_reply::<Reply>("no json here").is_err());
    }
}
