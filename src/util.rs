use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

/// Local name of an IRI, i.e. everything after the last `#` or `/`.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

/// Deterministic pseudo-random pair in `[-1, 1]` derived from an id.
pub fn stable_pair(id: &str) -> (f64, f64) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = (hash & 0xffff_ffff) as f64 / u32::MAX as f64;
    let y = ((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop(self, message: Option<&str>) -> Duration {
        let elapsed = self.elapsed();
        match message {
            Some(message) => log::debug!(
                "{} finished in {} ms ({message})",
                self.name,
                elapsed.as_millis()
            ),
            None => log::debug!("{} finished in {} ms", self.name, elapsed.as_millis()),
        }
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_strips_namespace() {
        assert_eq!(
            local_name("http://www.snik.eu/ontology/meta/isResponsibleFor"),
            "isResponsibleFor"
        );
        assert_eq!(local_name("http://www.w3.org/2000/01/rdf-schema#subClassOf"), "subClassOf");
        assert_eq!(local_name("plain"), "plain");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("http://www.snik.eu/ontology/bb/Patient");
        let second = stable_pair("http://www.snik.eu/ontology/bb/Patient");
        assert_eq!(first, second);
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }
}
