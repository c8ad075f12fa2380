use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::packstream::{from_value, PackStreamResult, Value};

bolt_structure! {
    Node = 0x4E => {
        id: i64,
        labels: Vec<String>,
        properties: HashMap<String, Value>,
        element_id: String,
    }
}

impl Node {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Decodes the property map into `T`.
    pub fn properties_as<T: DeserializeOwned>(&self) -> PackStreamResult<T> {
        from_value(Value::Map(self.properties.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::{decode_exact, encode, Structure, StructureDecode, StructureEncode};

    fn sample() -> Node {
        Node {
            id: 12,
            labels: vec!["Movie".to_string()],
            properties: [
                ("title".to_string(), Value::from("The Matrix")),
                ("released".to_string(), Value::from(1999)),
            ]
            .into_iter()
            .collect(),
            element_id: "4:abc:12".to_string(),
        }
    }

    #[test]
    fn test_node_wire_round_trip() {
        let bytes = encode(&Value::Structure(sample().to_structure().unwrap())).unwrap();
        assert_eq!(&bytes[..2], &[0xB4, 0x4E]);
        let node = Node::from_value(decode_exact(&bytes).unwrap()).unwrap();
        assert_eq!(node, sample());
        assert!(node.has_label("Movie"));
    }

    #[test]
    fn test_properties_as_struct() {
        #[derive(serde::Deserialize)]
        struct Movie {
            title: String,
            released: i64,
        }
        let movie: Movie = sample().properties_as().unwrap();
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.released, 1999);
    }

    #[test]
    fn test_missing_element_id_is_rejected() {
        let legacy = Structure::new(
            0x4E,
            vec![Value::from(1), Value::List(vec![]), Value::Map(HashMap::new())],
        );
        assert!(Node::from_structure(legacy).is_err());
    }
}
