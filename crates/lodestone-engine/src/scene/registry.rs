use crate::render::RenderCtx;

use super::Scene;

/// Builds a scene once the GPU is available.
pub type SceneFactory = Box<dyn FnMut(&RenderCtx<'_>) -> anyhow::Result<Box<dyn Scene>>>;

struct Entry {
    name: String,
    factory: Option<SceneFactory>,
    instance: Option<Box<dyn Scene>>,
}

/// Named scenes in registration order, at most one selected.
///
/// Scenes are created on first selection and kept alive afterwards, so a
/// scene keeps its state when the user goes back to the menu and returns.
#[derive(Default)]
pub struct SceneRegistry {
    entries: Vec<Entry>,
    selected: Option<usize>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`. Returns false if the name is taken.
    pub fn register<S, F>(&mut self, name: impl Into<String>, mut factory: F) -> bool
    where
        S: Scene + 'static,
        F: FnMut(&RenderCtx<'_>) -> anyhow::Result<S> + 'static,
    {
        let boxed: SceneFactory = Box::new(move |ctx| Ok(Box::new(factory(ctx)?) as Box<dyn Scene>));
        self.push(name.into(), Some(boxed), None)
    }

    /// Registers an already-built scene.
    pub fn register_instance(&mut self, name: impl Into<String>, scene: Box<dyn Scene>) -> bool {
        self.push(name.into(), None, Some(scene))
    }

    fn push(&mut self, name: String, factory: Option<SceneFactory>, instance: Option<Box<dyn Scene>>) -> bool {
        if self.entries.iter().any(|e| e.name == name) {
            log::warn!("scene \"{name}\" is already registered; ignoring the duplicate");
            return false;
        }
        self.entries.push(Entry { name, factory, instance });
        true
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selects the scene registered as `name`. Unknown names leave the
    /// selection unchanged and return false.
    pub fn select(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(i) => {
                log::info!("scene selected: {name}");
                self.selected = Some(i);
                true
            }
            None => {
                log::warn!("no scene named \"{name}\"");
                false
            }
        }
    }

    /// Back to the menu.
    pub fn deselect(&mut self) {
        if let Some(name) = self.selected_name() {
            log::info!("scene closed: {name}");
        }
        self.selected = None;
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.map(|i| self.entries[i].name.as_str())
    }

    /// True when a scene is selected but not built yet.
    pub fn needs_instance(&self) -> bool {
        self.selected.is_some_and(|i| self.entries[i].instance.is_none())
    }

    /// Builds the selected scene if needed. On failure the selection is
    /// cleared and the error returned.
    pub fn ensure_instance(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        let Some(i) = self.selected else { return Ok(()) };
        let entry = &mut self.entries[i];
        if entry.instance.is_some() {
            return Ok(());
        }

        let built = match entry.factory.as_mut() {
            Some(factory) => factory(ctx),
            None => Err(anyhow::anyhow!("scene \"{}\" has no factory", entry.name)),
        };
        match built {
            Ok(scene) => {
                log::debug!("scene \"{}\" instantiated", entry.name);
                entry.instance = Some(scene);
                Ok(())
            }
            Err(e) => {
                let e = e.context(format!("failed to create scene \"{}\"", entry.name));
                self.selected = None;
                Err(e)
            }
        }
    }

    /// The selected scene, once built.
    pub fn current_mut(&mut self) -> Option<&mut (dyn Scene + 'static)> {
        let i = self.selected?;
        self.entries[i].instance.as_deref_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderTarget;

    struct Counter {
        name: &'static str,
        fail_update: bool,
    }

    impl Counter {
        fn boxed(name: &'static str) -> Box<dyn Scene> {
            Box::new(Self { name, fail_update: false })
        }
    }

    impl Scene for Counter {
        fn name(&self) -> &str {
            self.name
        }

        fn on_update(&mut self, _dt: f32) -> anyhow::Result<()> {
            anyhow::ensure!(!self.fail_update, "update failed");
            Ok(())
        }

        fn on_render(&mut self, _ctx: &RenderCtx<'_>, _target: &mut RenderTarget<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn registry() -> SceneRegistry {
        let mut r = SceneRegistry::new();
        assert!(r.register_instance("Clear color", Counter::boxed("Clear color.")));
        assert!(r.register_instance("Texture", Counter::boxed("Texture")));
        r
    }

    #[test]
    fn nothing_is_selected_initially() {
        let mut r = registry();
        assert_eq!(r.selected_name(), None);
        assert!(r.current_mut().is_none());
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["Clear color", "Texture"]);
    }

    #[test]
    fn select_by_name_dispatches_to_that_scene() {
        let mut r = registry();
        assert!(r.select("Texture"));
        assert!(!r.needs_instance());

        let scene = r.current_mut().unwrap();
        assert_eq!(scene.name(), "Texture");
        scene.on_update(0.016).unwrap();
    }

    #[test]
    fn unknown_name_keeps_current_selection() {
        let mut r = registry();
        r.select("Clear color");
        assert!(!r.select("Missing"));
        assert_eq!(r.selected_name(), Some("Clear color"));
    }

    #[test]
    fn deselect_falls_back_to_menu_and_keeps_state() {
        let mut r = registry();
        r.select("Texture");
        r.current_mut().unwrap().on_update(0.1).unwrap();
        r.deselect();
        assert!(r.current_mut().is_none());

        r.select("Texture");
        r.current_mut().unwrap().on_update(0.1).unwrap();
        r.deselect();
        assert_eq!(r.selected_name(), None);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut r = registry();
        assert!(!r.register_instance("Texture", Counter::boxed("other")));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn factory_scenes_need_an_instance_after_selection() {
        let mut r = SceneRegistry::new();
        r.register("Lazy", |_ctx: &RenderCtx<'_>| {
            Ok(Counter { name: "Lazy", fail_update: false })
        });
        assert!(!r.needs_instance());
        r.select("Lazy");
        assert!(r.needs_instance());
        assert!(r.current_mut().is_none());
    }

    #[test]
    fn failing_update_surfaces_as_error() {
        let mut r = SceneRegistry::new();
        r.register_instance("Bad", Box::new(Counter { name: "Bad", fail_update: true }));
        r.select("Bad");
        assert!(r.current_mut().unwrap().on_update(0.0).is_err());
    }
}
