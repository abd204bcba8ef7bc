//! Saved favorite routes.
//!
//! A favorite is a (carrier, departure, arrival) triple. The list is
//! deduplicated and order-preserving, and every mutation rewrites the
//! persisted list in full; there is no incremental patching, which
//! keeps the file crash-consistent at the cost of a full write.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Carrier;

/// A saved departure/arrival pair for one carrier.
///
/// Equality of the whole triple is the uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRoute {
    pub carrier: Carrier,
    pub departure: String,
    pub arrival: String,
}

/// Errors from favorite-route storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FavoritesError {
    /// The triple is already saved.
    #[error("this route is already saved")]
    DuplicateRoute,

    /// The list could not be persisted.
    #[error("failed to persist favorites: {0}")]
    Storage(String),
}

/// Store of favorite routes.
///
/// Injected rather than ambient so the wiring layer can substitute an
/// in-memory store in tests.
pub trait FavoritesStore {
    /// The saved routes, in insertion order.
    fn routes(&self) -> &[FavoriteRoute];

    /// Save a route. Reports [`FavoritesError::DuplicateRoute`] when an
    /// equal triple already exists.
    fn add(&mut self, route: FavoriteRoute) -> Result<(), FavoritesError>;

    /// Remove every entry equal to the triple (expected zero or one).
    /// Removing a route that is not saved is a silent no-op.
    fn remove(&mut self, route: &FavoriteRoute) -> Result<(), FavoritesError>;
}

/// Favorites persisted as one JSON file.
///
/// The file is read once at construction; a missing or unparsable file
/// degrades to an empty list rather than failing, so a corrupted file
/// can never wedge startup.
pub struct JsonFileFavorites {
    path: PathBuf,
    routes: Vec<FavoriteRoute>,
}

impl JsonFileFavorites {
    /// Open (or start) the favorites file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let routes = Self::load(&path);
        Self { path, routes }
    }

    fn load(path: &Path) -> Vec<FavoriteRoute> {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        match serde_json::from_str(&contents) {
            Ok(routes) => routes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt favorites file");
                Vec::new()
            }
        }
    }

    /// Rewrite the whole list. Creates parent directories if needed.
    fn persist(&self) -> Result<(), FavoritesError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| FavoritesError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&self.routes)
            .map_err(|e| FavoritesError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| FavoritesError::Storage(e.to_string()))
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStore for JsonFileFavorites {
    fn routes(&self) -> &[FavoriteRoute] {
        &self.routes
    }

    fn add(&mut self, route: FavoriteRoute) -> Result<(), FavoritesError> {
        if self.routes.contains(&route) {
            return Err(FavoritesError::DuplicateRoute);
        }
        self.routes.push(route);
        self.persist()
    }

    fn remove(&mut self, route: &FavoriteRoute) -> Result<(), FavoritesError> {
        let before = self.routes.len();
        self.routes.retain(|r| r != route);
        if self.routes.len() == before {
            return Ok(());
        }
        self.persist()
    }
}

/// In-memory favorites, for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct InMemoryFavorites {
    routes: Vec<FavoriteRoute>,
}

impl InMemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoritesStore for InMemoryFavorites {
    fn routes(&self) -> &[FavoriteRoute] {
        &self.routes
    }

    fn add(&mut self, route: FavoriteRoute) -> Result<(), FavoritesError> {
        if self.routes.contains(&route) {
            return Err(FavoritesError::DuplicateRoute);
        }
        self.routes.push(route);
        Ok(())
    }

    fn remove(&mut self, route: &FavoriteRoute) -> Result<(), FavoritesError> {
        self.routes.retain(|r| r != route);
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add(FavoriteRoute),
        Remove(FavoriteRoute),
    }

    fn arb_route() -> impl Strategy<Value = FavoriteRoute> {
        (
            prop_oneof![Just(Carrier::Srt), Just(Carrier::Ktx)],
            prop_oneof![Just("수서"), Just("서울"), Just("부산"), Just("목포")],
            prop_oneof![Just("부산"), Just("강릉"), Just("포항")],
        )
            .prop_map(|(carrier, dep, arr)| FavoriteRoute {
                carrier,
                departure: dep.to_string(),
                arrival: arr.to_string(),
            })
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            arb_route().prop_map(Op::Add),
            arb_route().prop_map(Op::Remove),
        ]
    }

    proptest! {
        /// No sequence of adds and removes can produce duplicates.
        #[test]
        fn list_never_holds_duplicates(ops in proptest::collection::vec(arb_op(), 0..40)) {
            let mut store = InMemoryFavorites::new();
            for op in ops {
                match op {
                    Op::Add(route) => {
                        let _ = store.add(route);
                    }
                    Op::Remove(route) => {
                        store.remove(&route).unwrap();
                    }
                }
            }
            let routes = store.routes();
            for (i, a) in routes.iter().enumerate() {
                for b in &routes[i + 1..] {
                    prop_assert_ne!(a, b);
                }
            }
        }
    }
}
