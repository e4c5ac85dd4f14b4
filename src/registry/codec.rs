//! Serde support: registries load from and save to plain maps.
//!
//! Loading goes through `put`, so marker conflicts in a configuration file
//! surface as deserialization errors.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::registry::{EnvRegistry, EnvironmentMarkers};

impl<'de, T> Deserialize<'de> for EnvRegistry<T>
where
    T: Deserialize<'de> + EnvironmentMarkers,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RegistryVisitor(PhantomData))
    }
}

struct RegistryVisitor<T>(PhantomData<fn() -> T>);

impl<'de, T> Visitor<'de> for RegistryVisitor<T>
where
    T: Deserialize<'de> + EnvironmentMarkers,
{
    type Value = EnvRegistry<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of environment names to configuration")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let registry = EnvRegistry::new();
        while let Some((key, value)) = map.next_entry::<String, T>()? {
            registry.put(&key, value).map_err(de::Error::custom)?;
        }
        Ok(registry)
    }
}

impl<T: Serialize> Serialize for EnvRegistry<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, &**value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EnvironmentFlags;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
    struct Silo {
        #[serde(flatten)]
        flags: EnvironmentFlags,
        domain: String,
    }

    impl EnvironmentMarkers for Silo {
        fn is_default(&self) -> bool {
            self.flags.is_default()
        }

        fn is_template(&self) -> bool {
            self.flags.is_template()
        }
    }

    #[test]
    fn test_load_from_toml() {
        let registry: EnvRegistry<Silo> = toml::from_str(
            r#"
            [S115]
            default_environment_configuration = true
            domain = "silo115-guest.example.com"

            [S116]
            domain = "silo116-guest.example.com"
            unknown_field = "tolerated"

            [template]
            template = true
            domain = "siloXXX-guest.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.default_key().unwrap(), "S115");
        assert_eq!(registry.template_key().unwrap(), "template");
        assert_eq!(
            registry.get(Some("S116")).unwrap().domain,
            "silo116-guest.example.com"
        );
    }

    #[test]
    fn test_conflict_fails_load() {
        let result: Result<EnvRegistry<Silo>, _> = toml::from_str(
            r#"
            [S115]
            default_environment_configuration = true
            domain = "a"

            [S116]
            default_environment_configuration = true
            domain = "b"
            "#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Only one default environment"), "{err}");
    }

    #[test]
    fn test_serialize_sorted_map() {
        let registry = EnvRegistry::new();
        registry.put("S2", "two".to_string()).unwrap();
        registry.put("S1", "one".to_string()).unwrap();
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"{"S1":"one","S2":"two"}"#);
    }
}
