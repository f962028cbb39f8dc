// Durations in config files: humantime strings ("10s", "2m") or bare
// integer seconds.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl From<Duration> for HumanDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct HumanDurationVisitor;

impl Visitor<'_> for HumanDurationVisitor {
    type Value = HumanDuration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration such as \"30s\" or a number of seconds")
    }

    fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Self::Value, E> {
        Ok(HumanDuration(Duration::from_secs(secs)))
    }

    fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Self::Value, E> {
        u64::try_from(secs)
            .map(|s| HumanDuration(Duration::from_secs(s)))
            .map_err(|_| E::custom("duration must not be negative"))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<u64>() {
            return Ok(HumanDuration(Duration::from_secs(secs)));
        }
        humantime::parse_duration(s)
            .map(HumanDuration)
            .map_err(|e| E::custom(format!("invalid duration '{s}': {e}")))
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HumanDurationVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        d: HumanDuration,
    }

    fn parse(toml_src: &str) -> Result<Duration, toml::de::Error> {
        toml::from_str::<Wrapper>(toml_src).map(|w| w.d.0)
    }

    #[test]
    fn accepts_humantime_and_seconds() {
        assert_eq!(parse("d = \"2m\"").unwrap(), Duration::from_secs(120));
        assert_eq!(parse("d = 45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse("d = \"15\"").unwrap(), Duration::from_secs(15));
    }

    #[test]
    fn rejects_garbage_and_negatives() {
        assert!(parse("d = \"soon\"").is_err());
        assert!(parse("d = -5").is_err());
    }

    #[test]
    fn displays_as_humantime() {
        assert_eq!(HumanDuration(Duration::from_secs(90)).to_string(), "1m 30s");
    }
}
