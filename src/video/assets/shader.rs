//! Pipeline state object that pairs a fragment program with immutable render state.

use crate::math::{Matrix3, Matrix4};
use crate::utils::prelude::HashValue;
use crate::video::assets::image::{CounterHandle, ImageHandle};
use crate::video::assets::texture::{RenderTextureHandle, TextureHandle};
use crate::video::errors::{Error, Result};
use crate::video::MAX_FRAMEBUFFER_ATTACHMENTS;

impl_handle!(ShaderHandle);

/// A `ShaderParams` encapusulate all the informations we need to configurate
/// the device before real drawing: which program runs and with what render states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParams {
    pub program: Program,
    pub state: RenderState,
}

impl ShaderParams {
    pub fn new(program: Program, state: RenderState) -> Self {
        ShaderParams { program, state }
    }
}

/// Where the vertices of a program come from.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VertexStage {
    /// Scene geometry transformed by `mat_mvp`, with per-vertex color and a
    /// normal transformed by the optional `mat_nrp`.
    Scene,
    /// A full-screen quad given in normalized device coordinates.
    Screen,
}

/// Every program the techniques know how to run. Backends provide one
/// implementation per variant: GLSL sources for OpenGL, Rust closures for the
/// software rasterizer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Program {
    /// Copies the `fb` texture to the screen.
    Background,
    /// Premultiplied vertex color scaled by `alpha`.
    Simple,
    /// Peels one depth layer behind the previous one, compositing over it.
    DepthPeel,
    RefractBackFace,
    RefractFrontFace,
    RefractBackFacePeel,
    RefractFrontFacePeel,
    Meshkin,
    BavoilMyersAccum,
    BavoilMyersResolve,
    BavoilMcGuireAccum,
    BavoilMcGuireWeightedAccum,
    BavoilMcGuireResolve,
    /// Pushes every fragment onto its pixel's linked list.
    ABufferBuild,
    /// Sorts and composites every pixel's linked list.
    ABufferResolve,
    /// Outputs the `layer`-th node of every pixel's sorted linked list.
    ABufferResolveLayer,
    /// Inserts fragments into the per-pixel visibility functions.
    AdaptiveVisibility,
    /// Weights fragments by the visibility in front of them.
    AdaptiveComposite,
}

const MVP: (&str, UniformVariableType) = ("mat_mvp", UniformVariableType::Matrix4f);
const NRP: (&str, UniformVariableType) = ("mat_nrp", UniformVariableType::Matrix3f);
const ALPHA: (&str, UniformVariableType) = ("alpha", UniformVariableType::F32);

impl Program {
    pub fn vertex_stage(self) -> VertexStage {
        match self {
            Program::Background
            | Program::BavoilMyersResolve
            | Program::BavoilMcGuireResolve
            | Program::ABufferResolve
            | Program::ABufferResolveLayer => VertexStage::Screen,
            _ => VertexStage::Scene,
        }
    }

    /// Returns true if the program reads or writes storage images, which needs
    /// atomic image load/store support on the device.
    pub fn requires_image_load_store(self) -> bool {
        match self {
            Program::ABufferBuild
            | Program::ABufferResolve
            | Program::ABufferResolveLayer
            | Program::AdaptiveVisibility
            | Program::AdaptiveComposite => true,
            _ => false,
        }
    }

    /// Returns true if the program writes storage images or counters. Later
    /// draws reading what it wrote need a memory barrier in between.
    pub fn writes_images(self) -> bool {
        match self {
            Program::ABufferBuild | Program::AdaptiveVisibility => true,
            _ => false,
        }
    }

    /// The uniforms the program reads, all of them required for a draw.
    pub fn uniforms(self) -> &'static [(&'static str, UniformVariableType)] {
        use self::UniformVariableType as T;

        match self {
            Program::Background => &[("fb", T::Texture)],
            Program::Simple
            | Program::BavoilMyersAccum
            | Program::BavoilMcGuireAccum
            | Program::BavoilMcGuireWeightedAccum => &[MVP, ALPHA],
            Program::DepthPeel => &[
                MVP,
                ALPHA,
                ("fb", T::RenderTexture),
                ("depth", T::RenderTexture),
            ],
            Program::RefractBackFace => &[MVP, NRP, ("fb", T::RenderTexture)],
            Program::RefractFrontFace
            | Program::RefractBackFacePeel
            | Program::RefractFrontFacePeel => &[
                MVP,
                NRP,
                ("fb", T::RenderTexture),
                ("depth", T::RenderTexture),
            ],
            Program::Meshkin => &[MVP, ALPHA, ("fb", T::RenderTexture)],
            Program::BavoilMyersResolve => {
                &[("accum", T::RenderTexture), ("count", T::RenderTexture)]
            }
            Program::BavoilMcGuireResolve => {
                &[("accum", T::RenderTexture), ("transp", T::RenderTexture)]
            }
            Program::ABufferBuild => &[
                MVP,
                ALPHA,
                ("head", T::Image),
                ("list", T::Image),
                ("counter", T::Counter),
            ],
            Program::ABufferResolve => &[("head", T::Image), ("list", T::Image)],
            Program::ABufferResolveLayer => {
                &[("head", T::Image), ("list", T::Image), ("layer", T::I32)]
            }
            Program::AdaptiveVisibility => &[
                MVP,
                ALPHA,
                ("alpha_tex", T::Image),
                ("depth_tex", T::Image),
                ("lock_tex", T::Image),
            ],
            Program::AdaptiveComposite => &[
                MVP,
                ALPHA,
                ("alpha_tex", T::Image),
                ("depth_tex", T::Image),
            ],
        }
    }

    /// Checks that `vars` provides every uniform this program reads, with the
    /// right types.
    pub fn validate(self, vars: &[UniformVar]) -> Result<()> {
        for &(name, tp) in self.uniforms() {
            let field: HashValue<str> = name.into();
            match vars.iter().find(|v| v.0 == field) {
                Some(&(_, v)) if v.variable_type() == tp => {}
                Some(&(_, v)) => {
                    return Err(Error::UniformMismatch(format!(
                        "{} of {:?} needs a {:?} instead of {:?}",
                        name,
                        self,
                        tp,
                        v.variable_type()
                    )));
                }
                None => return Err(Error::UniformUndefined(format!("{} of {:?}", name, self))),
            }
        }

        Ok(())
    }
}

/// Specify whether front- or back-facing polygons can be culled.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CullFace {
    Nothing,
    Front,
    Back,
}

/// Define front- and back-facing polygons.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FrontFaceOrder {
    Clockwise,
    CounterClockwise,
}

/// A pixel-wise comparison function.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Comparison {
    Never,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
    Always,
}

impl Comparison {
    #[inline]
    pub fn test(self, incoming: f32, stored: f32) -> bool {
        match self {
            Comparison::Never => false,
            Comparison::Less => incoming < stored,
            Comparison::LessOrEqual => incoming <= stored,
            Comparison::Greater => incoming > stored,
            Comparison::GreaterOrEqual => incoming >= stored,
            Comparison::Equal => (incoming - stored).abs() <= ::std::f32::EPSILON,
            Comparison::NotEqual => (incoming - stored).abs() > ::std::f32::EPSILON,
            Comparison::Always => true,
        }
    }
}

/// Specifies how incoming RGBA values (source) and the RGBA in framebuffer (destination)
/// are combined.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Equation {
    /// Adds source and destination. Source and destination are multiplied
    /// by blending parameters before addition.
    Add,
    /// Subtracts destination from source.
    Subtract,
    /// Subtracts source from destination.
    ReverseSubtract,
}

/// Blend values.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlendValue {
    SourceColor,
    SourceAlpha,
    DestinationColor,
    DestinationAlpha,
}

/// Blend factors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlendFactor {
    Zero,
    One,
    Value(BlendValue),
    OneMinusValue(BlendValue),
}

pub type Blend = (Equation, BlendFactor, BlendFactor);

/// A struct that encapsulate all the necessary render states. Blending is set
/// per color attachment.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct RenderState {
    pub cull_face: CullFace,
    pub front_face_order: FrontFaceOrder,
    pub depth_test: Comparison,
    pub depth_write: bool,
    pub color_blend: [Option<Blend>; MAX_FRAMEBUFFER_ATTACHMENTS],
    pub color_write: (bool, bool, bool, bool),
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            cull_face: CullFace::Nothing,
            front_face_order: FrontFaceOrder::CounterClockwise,
            depth_test: Comparison::Always, // no depth test,
            depth_write: false,             // no depth write,
            color_blend: [None; MAX_FRAMEBUFFER_ATTACHMENTS],
            color_write: (true, true, true, true),
        }
    }
}

impl RenderState {
    /// Blends every attachment with `src * source + dst * destination`.
    pub fn with_blend(mut self, src: BlendFactor, dst: BlendFactor) -> Self {
        self.color_blend = [Some((Equation::Add, src, dst)); MAX_FRAMEBUFFER_ATTACHMENTS];
        self
    }

    /// Overrides the blending of the attachment at `index`.
    pub fn with_blend_at(mut self, index: usize, src: BlendFactor, dst: BlendFactor) -> Self {
        self.color_blend[index] = Some((Equation::Add, src, dst));
        self
    }

    pub fn with_depth(mut self, test: Comparison, write: bool) -> Self {
        self.depth_test = test;
        self.depth_write = write;
        self
    }

    pub fn with_cull_face(mut self, face: CullFace) -> Self {
        self.cull_face = face;
        self
    }

    pub fn with_color_write(mut self, enable: bool) -> Self {
        self.color_write = (enable, enable, enable, enable);
        self
    }

    /// Returns true if every attachment shares the same blending.
    pub fn is_uniform_blend(&self) -> bool {
        self.color_blend.iter().all(|v| *v == self.color_blend[0])
    }
}

/// Uniform variable type.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UniformVariableType {
    Texture,
    RenderTexture,
    Image,
    Counter,
    I32,
    F32,
    Matrix3f,
    Matrix4f,
}

/// Uniform variable for program object. Matrices are supplied in column major
/// order, the way `cgmath` stores them.
#[derive(Debug, Copy, Clone)]
pub enum UniformVariable {
    Texture(TextureHandle),
    RenderTexture(RenderTextureHandle),
    Image(ImageHandle),
    Counter(CounterHandle),
    I32(i32),
    F32(f32),
    Matrix3f([[f32; 3]; 3]),
    Matrix4f([[f32; 4]; 4]),
}

pub type UniformVar = (HashValue<str>, UniformVariable);

impl UniformVariable {
    pub fn variable_type(&self) -> UniformVariableType {
        match *self {
            UniformVariable::Texture(_) => UniformVariableType::Texture,
            UniformVariable::RenderTexture(_) => UniformVariableType::RenderTexture,
            UniformVariable::Image(_) => UniformVariableType::Image,
            UniformVariable::Counter(_) => UniformVariableType::Counter,
            UniformVariable::I32(_) => UniformVariableType::I32,
            UniformVariable::F32(_) => UniformVariableType::F32,
            UniformVariable::Matrix3f(_) => UniformVariableType::Matrix3f,
            UniformVariable::Matrix4f(_) => UniformVariableType::Matrix4f,
        }
    }
}

impl Into<UniformVariable> for TextureHandle {
    fn into(self) -> UniformVariable {
        UniformVariable::Texture(self)
    }
}

impl Into<UniformVariable> for RenderTextureHandle {
    fn into(self) -> UniformVariable {
        UniformVariable::RenderTexture(self)
    }
}

impl Into<UniformVariable> for ImageHandle {
    fn into(self) -> UniformVariable {
        UniformVariable::Image(self)
    }
}

impl Into<UniformVariable> for CounterHandle {
    fn into(self) -> UniformVariable {
        UniformVariable::Counter(self)
    }
}

impl Into<UniformVariable> for i32 {
    fn into(self) -> UniformVariable {
        UniformVariable::I32(self)
    }
}

impl Into<UniformVariable> for f32 {
    fn into(self) -> UniformVariable {
        UniformVariable::F32(self)
    }
}

impl Into<UniformVariable> for Matrix3<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix3f(*self.as_ref())
    }
}

impl Into<UniformVariable> for Matrix4<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix4f(*self.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validate() {
        let mvp: UniformVariable = Matrix4::<f32>::from_scale(1.0).into();
        let vars = [("mat_mvp".into(), mvp), ("alpha".into(), 0.5f32.into())];
        assert!(Program::Simple.validate(&vars).is_ok());

        let vars = [("mat_mvp".into(), mvp)];
        assert!(Program::Simple.validate(&vars).is_err());

        let vars = [("mat_mvp".into(), mvp), ("alpha".into(), 1i32.into())];
        assert!(Program::Simple.validate(&vars).is_err());
    }

    #[test]
    fn blend() {
        let rs = RenderState::default().with_blend(BlendFactor::One, BlendFactor::One);
        assert!(rs.is_uniform_blend());

        let rs = rs.with_blend_at(1, BlendFactor::Zero, BlendFactor::Value(BlendValue::SourceColor));
        assert!(!rs.is_uniform_blend());
        assert_eq!(rs.color_blend[0], Some((Equation::Add, BlendFactor::One, BlendFactor::One)));
    }
}
