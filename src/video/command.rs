use crate::utils::prelude::HashValue;

use super::assets::prelude::*;
use super::MAX_UNIFORM_VARIABLES;

/// A draw call.
#[derive(Debug, Copy, Clone)]
pub struct Draw {
    pub(crate) uniforms: [UniformVar; MAX_UNIFORM_VARIABLES],
    pub(crate) uniforms_len: usize,

    pub shader: ShaderHandle,
    pub mesh: MeshHandle,
}

impl Draw {
    /// Creates a new and empty draw call.
    pub fn new(shader: ShaderHandle, mesh: MeshHandle) -> Self {
        let nil = (HashValue::zero(), UniformVariable::I32(0));
        Draw {
            shader,
            mesh,
            uniforms: [nil; MAX_UNIFORM_VARIABLES],
            uniforms_len: 0,
        }
    }

    /// Binds the named field with `UniformVariable`.
    pub fn set_uniform_variable<F, V>(&mut self, field: F, variable: V)
    where
        F: Into<HashValue<str>>,
        V: Into<UniformVariable>,
    {
        let field = field.into();
        let variable = variable.into();

        for i in 0..self.uniforms_len {
            if self.uniforms[i].0 == field {
                self.uniforms[i] = (field, variable);
                return;
            }
        }

        assert!(self.uniforms_len < MAX_UNIFORM_VARIABLES);
        self.uniforms[self.uniforms_len] = (field, variable);
        self.uniforms_len += 1;
    }

    /// Chained version of `set_uniform_variable`.
    #[inline]
    pub fn with<F, V>(mut self, field: F, variable: V) -> Self
    where
        F: Into<HashValue<str>>,
        V: Into<UniformVariable>,
    {
        self.set_uniform_variable(field, variable);
        self
    }

    #[inline]
    pub fn uniforms(&self) -> &[UniformVar] {
        &self.uniforms[0..self.uniforms_len]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::prelude::HandleLike;

    #[test]
    fn overwrite() {
        let shader = ShaderHandle::new(0, 1);
        let mesh = MeshHandle::new(0, 1);

        let mut dc = Draw::new(shader, mesh).with("alpha", 0.5f32).with("layer", 1);
        dc.set_uniform_variable("alpha", 0.25f32);
        assert_eq!(dc.uniforms().len(), 2);

        match dc.uniforms()[0].1 {
            UniformVariable::F32(v) => assert_eq!(v, 0.25),
            _ => unreachable!(),
        }
    }
}
