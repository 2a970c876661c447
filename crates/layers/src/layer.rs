use gpu::RenderFrame;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;

    /// Appends this layer's draw commands to `frame`.
    fn emit(&self, frame: &mut RenderFrame);
}
