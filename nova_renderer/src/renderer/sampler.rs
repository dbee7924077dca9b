//! Sampler description

/// Texel filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Wrap,
}

/// Validated construction parameters for a sampler
#[derive(Debug, Clone, Default)]
pub struct SamplerDesc {
    min: FilterMode,
    mag: FilterMode,
    wrap_mode: WrapMode,
    name: String,
}

impl SamplerDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_filter(mut self, m: FilterMode) -> Self {
        self.min = m;
        self
    }

    pub fn mag_filter(mut self, m: FilterMode) -> Self {
        self.mag = m;
        self
    }

    pub fn wrap_mode(mut self, w: WrapMode) -> Self {
        self.wrap_mode = w;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn get_min_filter(&self) -> FilterMode {
        self.min
    }

    pub fn get_mag_filter(&self) -> FilterMode {
        self.mag
    }

    pub fn get_wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
}
