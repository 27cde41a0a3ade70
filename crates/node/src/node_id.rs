use serde::{Deserialize, Deserializer, Serialize, Serializer};
use slotmap::KeyData;
use std::fmt;
use std::str::FromStr;

slotmap::new_key_type! {
    /// Unique identifier for a node in the document.
    ///
    /// Rendered on the wire as `"<index>:<version>"`. A stale id (its node
    /// was removed) never resolves again, even if the slot is reused.
    pub struct NodeId;
}

impl NodeId {
    pub fn as_u64(self) -> u64 {
        self.0.as_ffi()
    }

    fn index(self) -> u32 {
        (self.as_u64() & 0xffff_ffff) as u32
    }

    fn version(self) -> u32 {
        (self.as_u64() >> 32) as u32
    }

    /// Parse a wire id. Returns `None` for anything that isn't the exact
    /// form of an id the slot map could have issued.
    pub fn parse(s: &str) -> Option<Self> {
        let (index, version) = s.split_once(':')?;
        let index: u32 = index.parse().ok()?;
        let version: u32 = version.parse().ok()?;
        let id = Self::from((u64::from(version) << 32) | u64::from(index));
        // Slot map versions are always odd; `from_ffi` would silently
        // turn `3:0` into `3:1`
        (id.to_string() == s).then_some(id)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(KeyData::from_ffi(value))
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid node id: {s}"))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index(), self.version())
    }
}

impl Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_display_parse_roundtrip() {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        let id = map.insert(());
        let text = id.to_string();
        assert!(text.contains(':'));
        assert_eq!(NodeId::parse(&text), Some(id));
    }

    #[test]
    fn test_parse_rejects_bare_numbers() {
        // Ids coming from remote callers are untrusted
        assert_eq!(NodeId::parse("123"), None);
        assert_eq!(NodeId::parse("a:b"), None);
        assert_eq!(NodeId::parse(""), None);
    }

    #[test]
    fn test_parse_rejects_ids_never_issued() {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        let id = map.insert(());
        assert_eq!(id.to_string(), "1:1");

        assert_eq!(NodeId::parse("1:0"), None);
        assert_eq!(NodeId::parse("1:2"), None);
        assert_eq!(NodeId::parse("01:1"), None);
        assert_eq!(NodeId::parse("1:1"), Some(id));
    }

    #[test]
    fn test_stale_id_does_not_resolve() {
        let mut map: SlotMap<NodeId, &str> = SlotMap::with_key();
        let first = map.insert("first");
        map.remove(first);
        let second = map.insert("second");

        let reparsed = NodeId::parse(&first.to_string()).unwrap();
        assert!(map.get(reparsed).is_none());
        assert_eq!(map.get(second), Some(&"second"));
    }

    #[test]
    fn test_serializes_as_string() {
        let id = NodeId::from((3u64 << 32) | 7);
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!("7:3"));
    }
}
