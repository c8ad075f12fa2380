use std::collections::HashMap;

use crate::packstream::Value;

bolt_structure! {
    Relationship = 0x52 => {
        id: i64,
        start_node_id: i64,
        end_node_id: i64,
        rel_type: String,
        properties: HashMap<String, Value>,
        element_id: String,
        start_node_element_id: String,
        end_node_element_id: String,
    }
}

bolt_structure! {
    /// A relationship inside a path; its endpoints come from the path.
    UnboundRelationship = 0x72 => {
        id: i64,
        rel_type: String,
        properties: HashMap<String, Value>,
        element_id: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::{StructureDecode, StructureEncode};

    #[test]
    fn test_relationship_field_order() {
        let rel = Relationship {
            id: 5,
            start_node_id: 1,
            end_node_id: 2,
            rel_type: "ACTED_IN".to_string(),
            properties: HashMap::new(),
            element_id: "5:x:5".to_string(),
            start_node_element_id: "4:x:1".to_string(),
            end_node_element_id: "4:x:2".to_string(),
        };
        let structure = rel.to_structure().unwrap();
        assert_eq!(structure.signature, 0x52);
        assert_eq!(structure.fields.len(), 8);
        assert_eq!(structure.fields[3], Value::from("ACTED_IN"));
        assert_eq!(Relationship::from_structure(structure).unwrap(), rel);
    }
}
