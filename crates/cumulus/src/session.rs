//! Explicit lifecycle for the one live engine of a host.

use log::{debug, info};

use cumulus_core::geometry::Size;

use crate::{
    config::AppConfig, engine::CloudEngine, error::CumulusError, surface::RenderSurface,
};

/// Holds at most one [`CloudEngine`].
///
/// A host creates the engine when its cloud screen opens, borrows it while
/// words arrive, and destroys it when the screen closes. Creating while an
/// engine is live returns the live engine unchanged.
#[derive(Debug)]
pub struct CloudSession<S: RenderSurface> {
    engine: Option<CloudEngine<S>>,
}

impl<S: RenderSurface> CloudSession<S> {
    pub fn new() -> Self {
        Self { engine: None }
    }

    /// Returns the live engine, creating it first if there is none.
    ///
    /// `surface` is dropped when an engine already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a new engine cannot be built from `config`; the
    /// session then stays empty.
    pub fn create_instance(
        &mut self,
        surface_size_px: Size,
        surface: S,
        config: &AppConfig,
    ) -> Result<&mut CloudEngine<S>, CumulusError> {
        let engine = match self.engine.take() {
            Some(engine) => {
                debug!("Reusing live cloud engine");
                engine
            }
            None => CloudEngine::from_config(surface_size_px, surface, config)?,
        };
        Ok(self.engine.insert(engine))
    }

    pub fn instance(&self) -> Option<&CloudEngine<S>> {
        self.engine.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut CloudEngine<S>> {
        self.engine.as_mut()
    }

    /// Ends the session and hands back the engine, if any.
    pub fn destroy_instance(&mut self) -> Option<CloudEngine<S>> {
        let engine = self.engine.take();
        if let Some(engine) = &engine {
            info!(words = engine.len(); "Destroyed cloud engine");
        }
        engine
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }
}

impl<S: RenderSurface> Default for CloudSession<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SurfaceConfig, surface::HeadlessSurface};

    fn size() -> Size {
        Size::new(320.0, 480.0)
    }

    #[test]
    fn test_create_get_destroy() {
        let config = AppConfig::default();
        let mut session = CloudSession::new();
        assert!(!session.is_active());
        assert!(session.instance().is_none());

        session
            .create_instance(size(), HeadlessSurface::default(), &config)
            .unwrap()
            .add_word("hello");
        assert!(session.is_active());
        assert_eq!(session.instance().map(CloudEngine::len), Some(1));

        session.instance_mut().unwrap().add_word("world");

        let engine = session.destroy_instance().unwrap();
        assert_eq!(engine.len(), 2);
        assert!(!session.is_active());
        assert!(session.destroy_instance().is_none());
    }

    #[test]
    fn test_create_returns_live_engine() {
        let config = AppConfig::default();
        let mut session = CloudSession::new();
        session
            .create_instance(size(), HeadlessSurface::default(), &config)
            .unwrap()
            .add_word("kept");

        let engine = session
            .create_instance(Size::new(10.0, 10.0), HeadlessSurface::default(), &config)
            .unwrap();

        assert!(engine.contains_word("kept"));
        assert_eq!(engine.surface_size(), size());
    }

    #[test]
    fn test_failed_create_leaves_session_empty() {
        let config = AppConfig::default().with_surface(SurfaceConfig::new(0.0, 0.0, 1.0));
        let mut session: CloudSession<HeadlessSurface> = CloudSession::default();

        let result = session.create_instance(size(), HeadlessSurface::default(), &config);

        assert!(matches!(result, Err(CumulusError::Config(_))));
        assert!(!session.is_active());
    }

    #[test]
    fn test_new_instance_after_destroy_is_fresh() {
        let config = AppConfig::default();
        let mut session = CloudSession::new();
        session
            .create_instance(size(), HeadlessSurface::default(), &config)
            .unwrap()
            .add_word("old");
        session.destroy_instance();

        let engine = session
            .create_instance(size(), HeadlessSurface::default(), &config)
            .unwrap();
        assert!(engine.is_empty());
    }
}
