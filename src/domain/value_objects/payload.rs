use super::{EntityId, PROVISIONAL_PREFIX};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Serialized mutation stored in an outbox row. Always a JSON object holding
/// the mutation under `mutation` and the provisional id under `provisionalId`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ActionPayload(Value);

const MUTATION_KEY: &str = "mutation";
const PROVISIONAL_ID_KEY: &str = "provisionalId";

impl ActionPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn wrap<M: Serialize>(mutation: &M, provisional_id: &EntityId) -> Result<Self, String> {
        let mutation =
            serde_json::to_value(mutation).map_err(|e| format!("Unserializable mutation: {e}"))?;
        let mut map = serde_json::Map::new();
        map.insert(MUTATION_KEY.to_string(), mutation);
        map.insert(
            PROVISIONAL_ID_KEY.to_string(),
            Value::String(provisional_id.to_string()),
        );
        Self::new(Value::Object(map))
    }

    pub fn mutation<M: DeserializeOwned>(&self) -> Result<M, String> {
        let inner = self
            .0
            .get(MUTATION_KEY)
            .cloned()
            .ok_or_else(|| "Payload has no mutation".to_string())?;
        serde_json::from_value(inner).map_err(|e| format!("Undecodable mutation: {e}"))
    }

    pub fn provisional_id(&self) -> Option<EntityId> {
        self.0
            .get(PROVISIONAL_ID_KEY)
            .and_then(Value::as_str)
            .and_then(|raw| EntityId::parse(raw).ok())
    }

    /// Provisional ids (other than `own`) mentioned anywhere in the mutation.
    /// A non-empty result means the action depends on records the server has
    /// not assigned an id to yet.
    pub fn foreign_provisional_ids(&self, own: &EntityId) -> Vec<EntityId> {
        let mut found = Vec::new();
        if let Some(mutation) = self.0.get(MUTATION_KEY) {
            collect_provisional(mutation, &mut found);
        }
        found.retain(|id| id != own);
        found.sort();
        found.dedup();
        found
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    fn validate(value: &Value) -> Result<(), String> {
        if !value.is_object() {
            return Err("Action payload must be a JSON object".to_string());
        }
        Ok(())
    }
}

fn collect_provisional(value: &Value, out: &mut Vec<EntityId>) {
    match value {
        Value::String(raw) if raw.starts_with(PROVISIONAL_PREFIX) => {
            if let Ok(id) = EntityId::parse(raw) {
                out.push(id);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_provisional(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_provisional(item, out)),
        _ => {}
    }
}

impl From<ActionPayload> for Value {
    fn from(payload: ActionPayload) -> Self {
        payload.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrap_keeps_mutation_and_provisional_id() {
        let id = EntityId::provisional();
        let payload = ActionPayload::wrap(&json!({"caption": "hi"}), &id).unwrap();

        assert_eq!(payload.provisional_id(), Some(id));
        let decoded: Value = payload.mutation().unwrap();
        assert_eq!(decoded["caption"], "hi");
    }

    #[test]
    fn foreign_provisional_ids_skip_own_id() {
        let own = EntityId::provisional();
        let parent = EntityId::provisional();
        let payload = ActionPayload::wrap(
            &json!({"postId": parent.as_str(), "body": "nice", "tags": [own.as_str()]}),
            &own,
        )
        .unwrap();

        assert_eq!(payload.foreign_provisional_ids(&own), vec![parent]);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(ActionPayload::from_json_str("[1,2]").is_err());
        assert!(ActionPayload::from_json_str("null").is_err());
    }
}
