//! Location providers.

use super::LocationProvider;
use crate::geometry::Geo;

/// Fixed location supplied at construction (e.g. from CLI flags). Invalid
/// coordinates read as unavailable.
pub struct StaticLocation(Option<Geo>);

impl StaticLocation {
    pub fn new(location: Option<Geo>) -> Self {
        Self(location.filter(|g| g.is_valid()))
    }
}

impl LocationProvider for StaticLocation {
    fn current(&self) -> Option<Geo> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_location_passes_through() {
        let provider = StaticLocation::new(Some(Geo::new(37.7749, -122.4194)));
        assert!(provider.current().is_some());
    }

    #[test]
    fn test_absent_location() {
        assert!(StaticLocation::new(None).current().is_none());
    }

    #[test]
    fn test_invalid_location_reads_as_unavailable() {
        let provider = StaticLocation::new(Some(Geo::new(200.0, 0.0)));
        assert!(provider.current().is_none());
    }
}
