use gl;
use gl::types::*;
use std::cmp;
use std::ffi;

use crate::errors::*;

use super::super::Features;

/// Describes the OpenGL context profile.
#[derive(Debug, Copy, Clone)]
pub enum Profile {
    /// The context uses only future-compatible functions and definitions.
    Core,
    /// The context includes all immediate mode functions and definitions.
    Compatibility,
}

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Parses a version string like `4.5.0 NVIDIA 390.77` or `OpenGL ES 3.2 Mesa`.
    pub fn from_str(desc: &str) -> Result<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else if desc.starts_with("OpenGL ES-") {
            (true, &desc[13..])
        } else {
            (false, desc)
        };

        let desc = desc
            .split(' ')
            .next()
            .ok_or_else(|| format_err!("[GL] Version {} is unformaled.", desc))?;

        let mut iter = desc.split('.');
        let mut next = || -> Result<u8> {
            iter.next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| format_err!("[GL] Version {} is unformaled.", desc))
        };

        let major = next()?;
        let minor = next()?;

        if es {
            Ok(Version::ES(major, minor))
        } else {
            Ok(Version::GL(major, minor))
        }
    }

    /// Obtains the OpenGL version of the current context using the loaded functions.
    ///
    /// # Unsafe
    ///
    /// You must ensure that the functions belong to the current context, otherwise you will get
    /// an undefined behavior.
    pub unsafe fn parse() -> Result<Version> {
        let desc = parse_str(gl::VERSION)?;
        Version::from_str(&desc)
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// Returns the list of extensions supported by the context.
            ///
            /// *Safety*: the OpenGL context must be current in the thread.
            pub unsafe fn parse() -> Result<Extensions> {
                let mut num_extensions = 0;
                gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num_extensions);

                let mut extensions = Extensions::default();
                for i in 0..num_extensions {
                    let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
                    if ext.is_null() {
                        continue;
                    }

                    match ffi::CStr::from_ptr(ext as *const _).to_str() {
                        $(
                            Ok($string) => extensions.$field = true,
                        )+
                        _ => (),
                    }
                }

                Ok(extensions)
            }
        }
    }
}

extensions! {
    "GL_ARB_shader_image_load_store" => gl_arb_shader_image_load_store,
    "GL_ARB_shader_atomic_counters" => gl_arb_shader_atomic_counters,
    "GL_ARB_shading_language_420pack" => gl_arb_shading_language_420pack,
    "GL_ARB_draw_buffers_blend" => gl_arb_draw_buffers_blend,
    "GL_ARB_texture_snorm" => gl_arb_texture_snorm,
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug)]
pub struct Capabilities {
    /// Returns a version or release number. Vendor-specific information may follow the version
    /// number.
    pub version: Version,

    /// The company responsible for this GL implementation.
    pub vendor: String,

    /// The list of OpenGL extensions support by this implementation.
    pub extensions: Extensions,

    /// The name of the renderer. This name is typically specific to a particular
    /// configuration of a hardware platform.
    pub renderer: String,

    /// The OpenGL context profile if available.
    pub profile: Option<Profile>,

    /// Maximum width and height of `glViewport`.
    pub max_viewport_dims: (u32, u32),

    /// Maximum number of textures that can be bound to a program.
    pub max_combined_texture_image_units: u32,

    /// Maximum number of storage images that can be bound to a program.
    pub max_image_units: u32,

    /// Maximum number of color attachment bind points.
    pub max_color_attachments: u32,
}

impl Capabilities {
    pub unsafe fn parse() -> Result<Capabilities> {
        let version = Version::parse()?;
        let extensions = Extensions::parse()?;

        let mut caps = Capabilities {
            version,
            extensions,
            vendor: parse_str(gl::VENDOR)?,
            renderer: parse_str(gl::RENDERER)?,
            profile: Capabilities::parse_profile(version),
            max_viewport_dims: Capabilities::parse_viewport_dims(),
            max_combined_texture_image_units: parse_integer(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
            max_image_units: 0,
            max_color_attachments: parse_integer(gl::MAX_COLOR_ATTACHMENTS),
        };

        if caps.has_image_load_store() {
            caps.max_image_units = parse_integer(gl::MAX_IMAGE_UNITS);
        }

        Ok(caps)
    }

    /// Returns true if storage images, image atomics and atomic counters are
    /// available to fragment programs, with explicit `binding` layouts.
    pub fn has_image_load_store(&self) -> bool {
        self.version >= Version::GL(4, 2)
    }

    /// Returns true if every color attachment can be blended differently.
    pub fn has_indexed_blend(&self) -> bool {
        self.version >= Version::GL(4, 0) || self.extensions.gl_arb_draw_buffers_blend
    }

    pub fn features(&self) -> Features {
        Features {
            image_load_store: self.has_image_load_store() && self.max_image_units >= 3,
        }
    }

    #[inline]
    unsafe fn parse_viewport_dims() -> (u32, u32) {
        let mut val: [GLint; 2] = [0, 0];
        gl::GetIntegerv(gl::MAX_VIEWPORT_DIMS, val.as_mut_ptr());
        (val[0] as u32, val[1] as u32)
    }

    #[inline]
    unsafe fn parse_profile(version: Version) -> Option<Profile> {
        if version >= Version::GL(3, 2) {
            let val = parse_integer(gl::CONTEXT_PROFILE_MASK) as GLenum;
            if (val & gl::CONTEXT_COMPATIBILITY_PROFILE_BIT) != 0 {
                Some(Profile::Compatibility)
            } else if (val & gl::CONTEXT_CORE_PROFILE_BIT) != 0 {
                Some(Profile::Core)
            } else {
                None
            }
        } else {
            None
        }
    }
}

#[inline]
unsafe fn parse_integer(id: GLenum) -> u32 {
    let mut val = 0;
    gl::GetIntegerv(id, &mut val);
    val.max(0) as u32
}

#[inline]
unsafe fn parse_str(id: GLenum) -> Result<String> {
    let s = gl::GetString(id);
    if s.is_null() {
        bail!("[GL] String of {} is null.", id);
    }

    String::from_utf8(ffi::CStr::from_ptr(s as *const _).to_bytes().to_vec())
        .map_err(|_| format_err!("[GL] String of {} is unformaled.", id))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(
            Version::from_str("4.5.0 NVIDIA 390.77").unwrap(),
            Version::GL(4, 5)
        );

        assert_eq!(
            Version::from_str("OpenGL ES 3.2 Mesa 18.0.5").unwrap(),
            Version::ES(3, 2)
        );

        assert!(Version::from_str("garbage").is_err());
        assert!(Version::GL(4, 2) > Version::GL(3, 3));
        assert!(Version::GL(4, 2).partial_cmp(&Version::ES(3, 0)).is_none());
    }
}
