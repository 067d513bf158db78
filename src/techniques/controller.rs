//! The state machine selecting the active technique and the inspected layer.

use crate::errors::*;
use crate::video::prelude::*;

use super::{Technique, TechniqueId};

pub struct ModeController {
    techniques: Vec<Box<dyn Technique>>,
    index: usize,
    layer: i32,
}

impl ModeController {
    /// Creates a controller cycling through `techniques`, in order. The first
    /// one is active.
    pub fn new(techniques: Vec<Box<dyn Technique>>) -> Result<Self> {
        if techniques.is_empty() {
            bail!("At least one technique is required.");
        }

        Ok(ModeController {
            techniques,
            index: 0,
            layer: -1,
        })
    }

    /// Creates the techniques identified by `ids` and a controller over them.
    pub fn with_ids(video: &mut VideoSystem, ids: &[TechniqueId]) -> Result<Self> {
        let mut techniques = Vec::with_capacity(ids.len());
        for &id in ids {
            techniques.push(super::create(video, id)?);
        }

        Self::new(techniques)
    }

    #[inline]
    pub fn current(&self) -> &dyn Technique {
        self.techniques[self.index].as_ref()
    }

    #[inline]
    pub fn id(&self) -> TechniqueId {
        self.current().id()
    }

    /// Returns the inspected layer, or -1 if every layer is composited.
    #[inline]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }

    /// Activates the next technique, wrapping around.
    pub fn next(&mut self) -> TechniqueId {
        self.select((self.index + 1) % self.techniques.len())
    }

    /// Activates the previous technique, wrapping around.
    pub fn previous(&mut self) -> TechniqueId {
        let len = self.techniques.len();
        self.select((self.index + len - 1) % len)
    }

    fn select(&mut self, index: usize) -> TechniqueId {
        assert!(index < self.techniques.len());

        self.index = index;
        self.layer = -1;

        let id = self.id();
        info!("Switches to {} ({}).", id, id.label());
        id
    }

    /// Inspects the next layer, going back to compositing every layer once the
    /// layer cap of the active technique is reached. Techniques without layers
    /// stay at -1.
    pub fn advance_layer(&mut self) -> i32 {
        self.layer += 1;
        if self.layer >= self.id().layer_cap() {
            self.layer = -1;
        }

        debug!("Inspects layer {} of {}.", self.layer, self.id());
        self.layer
    }

    pub fn reset_layer(&mut self) {
        self.layer = -1;
    }

    /// Releases the resources of every technique.
    pub fn delete(self, video: &mut VideoSystem) -> Result<()> {
        for v in &self.techniques {
            v.delete(video)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::techniques::FrameContext;

    struct Dummy(TechniqueId);

    impl Technique for Dummy {
        fn id(&self) -> TechniqueId {
            self.0
        }

        fn render(&self, _: &mut VideoSystem, _: &FrameContext) -> Result<()> {
            Ok(())
        }

        fn delete(&self, _: &mut VideoSystem) -> Result<()> {
            Ok(())
        }
    }

    fn controller() -> ModeController {
        let techniques = TechniqueId::ALL
            .iter()
            .map(|&v| Box::new(Dummy(v)) as Box<dyn Technique>)
            .collect();

        ModeController::new(techniques).unwrap()
    }

    #[test]
    fn cycle() {
        let mut controller = controller();
        assert_eq!(controller.id(), TechniqueId::Alpha);

        for _ in 0..controller.len() {
            controller.next();
        }

        assert_eq!(controller.id(), TechniqueId::Alpha);
        assert_eq!(controller.previous(), TechniqueId::Multiplicative);
        assert_eq!(controller.next(), TechniqueId::Alpha);
        assert_eq!(controller.next(), TechniqueId::AlphaDp);
    }

    #[test]
    fn layers() {
        let mut controller = controller();
        assert_eq!(controller.advance_layer(), -1);

        controller.next();
        assert_eq!(controller.id(), TechniqueId::AlphaDp);

        let cap = controller.id().layer_cap();
        for i in 0..cap {
            assert_eq!(controller.advance_layer(), i);
        }

        assert_eq!(controller.advance_layer(), -1);

        controller.advance_layer();
        controller.advance_layer();
        assert_eq!(controller.layer(), 1);

        controller.next();
        assert_eq!(controller.layer(), -1);
    }

    #[test]
    fn empty() {
        assert!(ModeController::new(Vec::new()).is_err());
    }
}
