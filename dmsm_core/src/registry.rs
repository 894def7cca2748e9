use getset::Getters;

use crate::config::MarkerTypeDefinition;
use crate::marker_api::MarkerIcon;
use crate::prelude::*;

/// A configured kind of sign marker, bound to its marker set in the service.
#[derive(Clone, Debug, Getters, PartialEq)]
#[getset(get = "pub")]
pub struct MarkerType {
    keyword: String,
    /// Marker set id in the service, and the permission suffix
    id: String,
    label: String,
    icon: Option<MarkerIcon>,
}

impl MarkerType {
    pub fn matches(&self, first_line: &str) -> bool {
        self.keyword == first_line
    }
}

/// All marker types, in config order. Built once on activation and only read
/// afterwards.
#[derive(Debug, Default, Resource)]
pub struct MarkerTypeRegistry {
    marker_types: Vec<MarkerType>,
}

impl MarkerTypeRegistry {
    /// Resolves every definition against the marker service.
    ///
    /// Marker sets that already exist are reused, so building twice from the
    /// same config never duplicates them. A definition whose set can't be
    /// created is logged and left out.
    pub fn build(definitions: Vec<MarkerTypeDefinition>, api: &mut dyn MarkerApi) -> Self {
        let mut marker_types = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if marker_types
                .iter()
                .any(|known: &MarkerType| known.matches(definition.keyword()))
            {
                log::error!(
                    "Marker type [{}] reuses keyword {:?}, skipping it",
                    definition.section(),
                    definition.keyword()
                );
                continue;
            }
            let set = match api.find_or_create_marker_set(definition.id(), definition.label(), true) {
                Ok(set) => set,
                Err(e) => {
                    log::error!("Could not load marker type [{}]: {e}", definition.section());
                    continue;
                },
            };
            let icon = api.marker_icon(definition.icon());
            if icon.is_none() {
                log::warn!(
                    "Icon {:?} for marker type {} is unknown to the marker service, it will use its default",
                    definition.icon(),
                    definition.id()
                );
            }
            log::info!("Loaded a marker type with id {}", set.id());
            marker_types.push(MarkerType {
                keyword: definition.keyword().clone(),
                id: set.id().clone(),
                label: set.label().clone(),
                icon,
            });
        }
        log::info!("{} marker type(s) ready", marker_types.len());
        MarkerTypeRegistry { marker_types }
    }

    pub fn by_keyword(&self, first_line: &str) -> Option<&MarkerType> {
        self.marker_types
            .iter()
            .find(|marker_type| marker_type.matches(first_line))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkerType> {
        self.marker_types.iter()
    }

    pub fn len(&self) -> usize {
        self.marker_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marker_types.is_empty()
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::marker_api::InMemoryMarkerApi;

    fn definitions() -> Vec<MarkerTypeDefinition> {
        vec![
            MarkerTypeDefinition::new("plot", "[plot]", "plots", "Plots", "house"),
            MarkerTypeDefinition::new("shop", "[shop]", "shops", "Shops", "no_such_icon"),
        ]
    }

    #[test]
    fn building_twice_reuses_marker_sets() {
        let mut api = InMemoryMarkerApi::with_default_icons();
        let first = MarkerTypeRegistry::build(definitions(), &mut api);
        let second = MarkerTypeRegistry::build(definitions(), &mut api);
        assert_eq!(api.marker_set_count(), 2);
        assert_eq!(first.len(), 2);
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            second.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn existing_set_keeps_its_label() {
        let mut api = InMemoryMarkerApi::with_default_icons();
        api.create_marker_set("plots", "Land Claims", true).unwrap();
        let registry = MarkerTypeRegistry::build(definitions(), &mut api);
        assert_eq!(registry.by_keyword("[plot]").unwrap().label(), "Land Claims");
    }

    #[test]
    fn unknown_icon_is_not_fatal() {
        let mut api = InMemoryMarkerApi::with_default_icons();
        let registry = MarkerTypeRegistry::build(definitions(), &mut api);
        let shop = registry.by_keyword("[shop]").unwrap();
        assert_eq!(shop.icon(), &None);
        let plot = registry.by_keyword("[plot]").unwrap();
        assert_eq!(plot.icon(), &Some(MarkerIcon("house".to_string())));
    }

    #[test]
    fn keyword_lookup_is_exact() {
        let mut api = InMemoryMarkerApi::with_default_icons();
        let registry = MarkerTypeRegistry::build(definitions(), &mut api);
        assert!(registry.by_keyword("[plot]").is_some());
        assert!(registry.by_keyword("[PLOT]").is_none());
        assert!(registry.by_keyword(" [plot]").is_none());
        assert!(registry.by_keyword("").is_none());
    }

    #[test]
    fn refused_sets_are_left_out() {
        let mut api = InMemoryMarkerApi::with_default_icons().refusing_sets();
        let registry = MarkerTypeRegistry::build(definitions(), &mut api);
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_keywords_keep_first() {
        let mut api = InMemoryMarkerApi::with_default_icons();
        let mut definitions = definitions();
        definitions.push(MarkerTypeDefinition::new(
            "farm", "[plot]", "farms", "Farms", "wheat",
        ));
        let registry = MarkerTypeRegistry::build(definitions, &mut api);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.by_keyword("[plot]").unwrap().id(), "plots");
        assert!(api.marker_set("farms").is_none());
    }
}
