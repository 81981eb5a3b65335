use log::{info, warn};

use crate::space::{Identity, Space, SpaceLabel, resolve_space};
use crate::storage::{CURRENT_IDENTITY_KEY, KeyValueStore, verified_key};

type Observer = Box<dyn FnMut(&Space) + Send>;

/// Active space plus its security-code gate
///
/// One context is built per navigation (or per request on the server). It
/// owns the store it reads from, so handlers can hand the store's pending
/// writes back to the browser afterwards.
pub struct SpaceContext<S: KeyValueStore> {
    store: S,
    space: Space,
    verified: bool,
    observers: Vec<Observer>,
}

impl<S: KeyValueStore> SpaceContext<S> {
    /// Resolve the space for `path` against `store`
    ///
    /// # Arguments
    /// * `path` - Current navigation path
    /// * `store` - Browser-scoped key-value store
    ///
    /// # Returns
    /// * `SpaceContext<S>` - Context with identity, label and verified flag loaded
    pub fn new(path: &str, store: S) -> Self {
        let mut context = SpaceContext {
            store,
            space: Space::SHARED,
            verified: true,
            observers: Vec::new(),
        };
        context.refresh(path);
        context
    }

    /// Register a callback invoked with the new space after every navigation
    pub fn subscribe(&mut self, observer: impl FnMut(&Space) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Recompute the space for a new path and notify observers
    pub fn navigate(&mut self, path: &str) -> Space {
        self.refresh(path);
        let space = self.space;
        for observer in self.observers.iter_mut() {
            observer(&space);
        }
        space
    }

    fn refresh(&mut self, path: &str) {
        let remembered = self.store.get(CURRENT_IDENTITY_KEY);
        self.space = resolve_space(path, remembered.as_deref());
        self.verified = match self.space.identity {
            Some(identity) => self.stored_flag(identity),
            None => true,
        };
    }

    fn stored_flag(&self, identity: Identity) -> bool {
        self.store.get(&verified_key(identity)).as_deref() == Some("true")
    }

    /// Check a submitted security code against the active identity
    ///
    /// A match marks the identity verified and remembers it, so later
    /// unscoped navigation stays in this space. A mismatch changes nothing.
    ///
    /// # Arguments
    /// * `candidate` - Code exactly as submitted (case-sensitive, untrimmed)
    ///
    /// # Returns
    /// * `bool` - Whether the code matched; always `false` in the shared space
    pub fn check_code(&mut self, candidate: &str) -> bool {
        let Some(identity) = self.space.identity else {
            return false;
        };

        if !identity.codes().iter().any(|code| *code == candidate) {
            warn!("Rejected security code for {identity}");
            return false;
        }

        self.store.set(&verified_key(identity), "true");
        self.store.set(CURRENT_IDENTITY_KEY, identity.as_str());
        self.verified = true;
        info!("{identity} verified");
        true
    }

    /// Whether the active space may be shown
    pub fn is_verified(&self) -> bool {
        self.space.identity.is_none() || self.verified
    }

    /// Sign out: drop the verification flag and the remembered identity
    pub fn clear(&mut self) {
        if let Some(identity) = self.space.identity {
            self.store.remove(&verified_key(identity));
            info!("Cleared verification for {identity}");
        }
        self.store.remove(CURRENT_IDENTITY_KEY);
        self.verified = false;
    }

    pub fn identity(&self) -> Option<Identity> {
        self.space.identity
    }

    pub fn label(&self) -> SpaceLabel {
        self.space.label
    }

    pub fn space(&self) -> Space {
        self.space
    }

    pub fn accent_color(&self) -> &'static str {
        self.space.label.accent_color()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
