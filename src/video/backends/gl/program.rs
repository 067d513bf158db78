//! GLSL sources of every `Program`.

use super::super::super::assets::prelude::{Program, VertexStage};

const SCENE_VS: &str = include_str!("shaders/scene.vs");
const SCREEN_VS: &str = include_str!("shaders/screen.vs");

const BACKGROUND_FS: &str = include_str!("shaders/background.fs");
const SIMPLE_FS: &str = include_str!("shaders/simple.fs");
const DEPTH_PEEL_FS: &str = include_str!("shaders/depth_peel.fs");
const REFRACT_FS: &str = include_str!("shaders/refract.fs");
const MESHKIN_FS: &str = include_str!("shaders/meshkin.fs");
const BAVOIL_MYERS_ACCUM_FS: &str = include_str!("shaders/bavoil_myers_accum.fs");
const BAVOIL_MYERS_RESOLVE_FS: &str = include_str!("shaders/bavoil_myers_resolve.fs");
const BAVOIL_MCGUIRE_ACCUM_FS: &str = include_str!("shaders/bavoil_mcguire_accum.fs");
const BAVOIL_MCGUIRE_RESOLVE_FS: &str = include_str!("shaders/bavoil_mcguire_resolve.fs");
const ABUFFER_BUILD_FS: &str = include_str!("shaders/abuffer_build.fs");
const ABUFFER_RESOLVE_FS: &str = include_str!("shaders/abuffer_resolve.fs");
const ADAPTIVE_FS: &str = include_str!("shaders/adaptive.fs");

/// The preprocessed sources of a program, ready to compile.
#[derive(Debug, Clone)]
pub struct ProgramSources {
    pub vs: String,
    pub fs: String,
}

fn fragment(program: Program) -> (&'static str, &'static [&'static str]) {
    match program {
        Program::Background => (BACKGROUND_FS, &[]),
        Program::Simple => (SIMPLE_FS, &[]),
        Program::DepthPeel => (DEPTH_PEEL_FS, &[]),
        Program::RefractBackFace => (REFRACT_FS, &[]),
        Program::RefractFrontFace => (REFRACT_FS, &["FRONT_FACE"]),
        Program::RefractBackFacePeel => (REFRACT_FS, &["PEEL"]),
        Program::RefractFrontFacePeel => (REFRACT_FS, &["FRONT_FACE", "PEEL"]),
        Program::Meshkin => (MESHKIN_FS, &[]),
        Program::BavoilMyersAccum => (BAVOIL_MYERS_ACCUM_FS, &[]),
        Program::BavoilMyersResolve => (BAVOIL_MYERS_RESOLVE_FS, &[]),
        Program::BavoilMcGuireAccum => (BAVOIL_MCGUIRE_ACCUM_FS, &[]),
        Program::BavoilMcGuireWeightedAccum => (BAVOIL_MCGUIRE_ACCUM_FS, &["WEIGHTED"]),
        Program::BavoilMcGuireResolve => (BAVOIL_MCGUIRE_RESOLVE_FS, &[]),
        Program::ABufferBuild => (ABUFFER_BUILD_FS, &[]),
        Program::ABufferResolve => (ABUFFER_RESOLVE_FS, &[]),
        Program::ABufferResolveLayer => (ABUFFER_RESOLVE_FS, &["LAYER"]),
        Program::AdaptiveVisibility => (ADAPTIVE_FS, &["VISIBILITY"]),
        Program::AdaptiveComposite => (ADAPTIVE_FS, &["COMPOSITE"]),
    }
}

/// Returns the sources of `program`, prefixed with the version directive and
/// the defines selecting its variant.
pub fn sources(program: Program) -> ProgramSources {
    let version = if program.requires_image_load_store() {
        "#version 420 core\n"
    } else {
        "#version 330 core\n"
    };

    let vs = match program.vertex_stage() {
        VertexStage::Scene => SCENE_VS,
        VertexStage::Screen => SCREEN_VS,
    };

    let (fs, defines) = fragment(program);
    let mut header = version.to_owned();
    for v in defines {
        header.push_str("#define ");
        header.push_str(v);
        header.push('\n');
    }

    ProgramSources {
        vs: format!("{}{}", version, vs),
        fs: format!("{}{}", header, fs),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn variants() {
        let src = sources(Program::RefractFrontFacePeel);
        assert!(src.fs.starts_with("#version 330 core\n#define FRONT_FACE\n#define PEEL\n"));
        assert!(src.vs.contains("mat_mvp"));

        let src = sources(Program::ABufferResolve);
        assert!(src.fs.starts_with("#version 420 core\n"));
        assert!(!src.fs.contains("#define LAYER"));
        assert!(src.vs.contains("gl_Position = vec4(Position.xy"));
    }
}
