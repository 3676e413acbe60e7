//! Per-patch-type draw shader configuration.
//!
//! Hardware tessellation draws each patch type of a subdivision surface
//! with a different shader permutation: B-spline patches for the regular
//! interior (single-crease capable), Gregory patches near irregularities.
//! The registry maps a patch type to the preprocessor configuration of
//! the vertex/hull/domain stages and compiles it through a
//! caller-supplied [`ShaderCompiler`], caching the result. Shader source
//! text is equally caller-supplied, so the registry itself stays API
//! agnostic.

use std::collections::HashMap;
use std::rc::Rc;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Type of a patch emitted by patch-table construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PatchType {
    /// Regular B-spline interior patch.
    Regular = 0,
    /// B-spline patch along a boundary.
    Boundary = 1,
    /// B-spline patch at a boundary corner.
    Corner = 2,
    /// Gregory patch around an extraordinary vertex.
    Gregory = 3,
    /// Gregory patch around an extraordinary vertex on a boundary.
    GregoryBoundary = 4,
    /// Gregory-basis patch, drawn through the regular path.
    GregoryBasis = 5,
    /// Non-patch primitives, drawn through the fixed pipeline.
    Points = 6,
    Lines = 7,
    Quads = 8,
    Triangles = 9,
}

/// Pipeline stage of a patch shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
}

impl ShaderStage {
    /// Conventional entry point name for the stage.
    pub fn entry_point(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main_patches",
            ShaderStage::Hull => "hs_main_patches",
            ShaderStage::Domain => "ds_main_patches",
            ShaderStage::Geometry => "gs_main",
            ShaderStage::Pixel => "ps_main",
        }
    }

    /// Shader model 5 compile target for the stage.
    pub fn target(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Hull => "hs_5_0",
            ShaderStage::Domain => "ds_5_0",
            ShaderStage::Geometry => "gs_5_0",
            ShaderStage::Pixel => "ps_5_0",
        }
    }
}

/// Shader source text shared by every configuration; supplied by the
/// caller in the shading language of its backend.
#[derive(Clone, Debug, Default)]
pub struct ShaderSources {
    /// Prologue prepended to every stage.
    pub common: String,
    /// B-spline patch shader body.
    pub bspline: String,
    /// Gregory patch shader body.
    pub gregory: String,
}

/// Preprocessor and source configuration of one stage.
#[derive(Clone, Debug, Default)]
pub struct SectionConfig {
    pub source: String,
    pub entry_point: String,
    pub target: String,
    pub defines: Vec<(String, String)>,
}

impl SectionConfig {
    fn stage(sources: &str, stage: ShaderStage) -> Self {
        Self {
            source: sources.to_owned(),
            entry_point: stage.entry_point().to_owned(),
            target: stage.target().to_owned(),
            defines: Vec::new(),
        }
    }

    fn define(&mut self, name: &str) {
        self.defines.push((name.to_owned(), String::new()));
    }

    /// `true` when the stage has nothing to compile.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Source configuration of a full patch draw: the common prologue plus
/// one section per stage.
#[derive(Clone, Debug, Default)]
pub struct DrawSourceConfig {
    pub common: SectionConfig,
    pub vertex_shader: SectionConfig,
    pub hull_shader: SectionConfig,
    pub domain_shader: SectionConfig,
    /// Left empty by the patch dispatch; callers wanting a geometry or
    /// pixel stage fill these before compiling.
    pub geometry_shader: SectionConfig,
    pub pixel_shader: SectionConfig,
}

impl DrawSourceConfig {
    /// Build the stage configuration for one patch type.
    ///
    /// Patch types without a tessellation path (Gregory-basis patches
    /// among them) produce an empty configuration: nothing is compiled
    /// and the patches fall back to the caller's default pipeline.
    pub fn for_patch_type(patch_type: PatchType, sources: &ShaderSources) -> Self {
        let mut config = DrawSourceConfig::default();
        match patch_type {
            PatchType::Regular | PatchType::Boundary | PatchType::Corner => {
                config.common = SectionConfig {
                    source: sources.common.clone(),
                    ..Default::default()
                };
                config.common.define("OSD_PATCH_BSPLINE");
                config.common.define("OSD_PATCH_ENABLE_SINGLE_CREASE");
                config.vertex_shader = SectionConfig::stage(&sources.bspline, ShaderStage::Vertex);
                config.hull_shader = SectionConfig::stage(&sources.bspline, ShaderStage::Hull);
                config.domain_shader = SectionConfig::stage(&sources.bspline, ShaderStage::Domain);
            }
            PatchType::Gregory => {
                config.common = SectionConfig {
                    source: sources.common.clone(),
                    ..Default::default()
                };
                config.common.define("OSD_PATCH_GREGORY");
                config.vertex_shader = SectionConfig::stage(&sources.gregory, ShaderStage::Vertex);
                config.hull_shader = SectionConfig::stage(&sources.gregory, ShaderStage::Hull);
                config.domain_shader = SectionConfig::stage(&sources.gregory, ShaderStage::Domain);
            }
            PatchType::GregoryBoundary => {
                config.common = SectionConfig {
                    source: sources.common.clone(),
                    ..Default::default()
                };
                config.common.define("OSD_PATCH_GREGORY_BOUNDARY");
                config.vertex_shader = SectionConfig::stage(&sources.gregory, ShaderStage::Vertex);
                config.hull_shader = SectionConfig::stage(&sources.gregory, ShaderStage::Hull);
                config.domain_shader = SectionConfig::stage(&sources.gregory, ShaderStage::Domain);
                for section in [
                    &mut config.vertex_shader,
                    &mut config.hull_shader,
                    &mut config.domain_shader,
                ] {
                    section.define("OSD_PATCH_GREGORY_BOUNDARY");
                }
            }
            PatchType::GregoryBasis
            | PatchType::Points
            | PatchType::Lines
            | PatchType::Quads
            | PatchType::Triangles => {}
        }
        config
    }
}

/// Backend shader compilation, implemented by the caller.
pub trait ShaderCompiler {
    /// Compiled program of one stage.
    type Program;
    /// Vertex input layout object of the backend.
    type InputLayout;

    /// Compile one stage; `Err` carries the backend diagnostic. A failed
    /// stage is logged by the registry and left empty, a patch type with
    /// a missing stage simply does not draw.
    fn compile(
        &mut self,
        stage: ShaderStage,
        common: &SectionConfig,
        section: &SectionConfig,
    ) -> std::result::Result<Self::Program, String>;

    /// Create the vertex input layout from a successfully compiled
    /// vertex program.
    fn input_layout(&mut self, vertex: &Self::Program) -> Option<Self::InputLayout>;
}

/// Compiled draw configuration of one patch type.
pub struct DrawConfig<C: ShaderCompiler> {
    pub vertex_shader: Option<C::Program>,
    pub hull_shader: Option<C::Program>,
    pub domain_shader: Option<C::Program>,
    pub geometry_shader: Option<C::Program>,
    pub pixel_shader: Option<C::Program>,
    /// Shared with the registry; one layout serves every patch type.
    pub input_layout: Option<Rc<C::InputLayout>>,
}

/// Cache of compiled [`DrawConfig`]s, one per patch type.
pub struct DrawRegistry<C: ShaderCompiler> {
    sources: ShaderSources,
    configs: HashMap<PatchType, DrawConfig<C>>,
    /// Created once from the first successful vertex compile; the vertex
    /// signature is the same for every patch shader.
    input_layout: Option<Rc<C::InputLayout>>,
}

impl<C: ShaderCompiler> DrawRegistry<C> {
    pub fn new(sources: ShaderSources) -> Self {
        Self {
            sources,
            configs: HashMap::new(),
            input_layout: None,
        }
    }

    /// The cached vertex input layout, if any vertex stage has compiled.
    pub fn input_layout(&self) -> Option<&C::InputLayout> {
        self.input_layout.as_deref()
    }

    /// The draw configuration for `patch_type`, compiling it on first
    /// use. A failing stage is logged and left empty rather than
    /// aborting the whole configuration.
    pub fn draw_config(&mut self, patch_type: PatchType, compiler: &mut C) -> &DrawConfig<C> {
        let Self {
            sources,
            configs,
            input_layout,
        } = self;
        configs.entry(patch_type).or_insert_with(|| {
            let source = DrawSourceConfig::for_patch_type(patch_type, sources);
            let mut config = DrawConfig {
                vertex_shader: None,
                hull_shader: None,
                domain_shader: None,
                geometry_shader: None,
                pixel_shader: None,
                input_layout: None,
            };
            for (stage, section, slot) in [
                (
                    ShaderStage::Vertex,
                    &source.vertex_shader,
                    &mut config.vertex_shader,
                ),
                (ShaderStage::Hull, &source.hull_shader, &mut config.hull_shader),
                (
                    ShaderStage::Domain,
                    &source.domain_shader,
                    &mut config.domain_shader,
                ),
                (
                    ShaderStage::Geometry,
                    &source.geometry_shader,
                    &mut config.geometry_shader,
                ),
                (
                    ShaderStage::Pixel,
                    &source.pixel_shader,
                    &mut config.pixel_shader,
                ),
            ] {
                if section.is_empty() {
                    continue;
                }
                match compiler.compile(stage, &source.common, section) {
                    Ok(program) => *slot = Some(program),
                    Err(diagnostic) => log::warn!(
                        "failed to compile {stage:?} stage for {patch_type:?} patches: \
                         {diagnostic}"
                    ),
                }
            }
            // The first successful vertex compile provides the layout;
            // later configurations reuse it, never rebuild it.
            if let Some(vertex) = &config.vertex_shader {
                if input_layout.is_none() {
                    *input_layout = compiler.input_layout(vertex).map(Rc::new);
                }
                config.input_layout = input_layout.clone();
            }
            config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingCompiler {
        compiled: Vec<(ShaderStage, String)>,
        fail_hull: bool,
        layouts_built: usize,
    }

    impl ShaderCompiler for RecordingCompiler {
        type Program = String;
        type InputLayout = usize;

        fn compile(
            &mut self,
            stage: ShaderStage,
            common: &SectionConfig,
            section: &SectionConfig,
        ) -> Result<String, String> {
            if self.fail_hull && stage == ShaderStage::Hull {
                return Err("hull stage rejected".into());
            }
            let defines: Vec<&str> = common
                .defines
                .iter()
                .chain(&section.defines)
                .map(|(name, _)| name.as_str())
                .collect();
            let program = format!("{}:{}", section.entry_point, defines.join(","));
            self.compiled.push((stage, program.clone()));
            Ok(program)
        }

        fn input_layout(&mut self, _vertex: &String) -> Option<usize> {
            self.layouts_built += 1;
            Some(1)
        }
    }

    fn sources() -> ShaderSources {
        ShaderSources {
            common: "common".into(),
            bspline: "bspline".into(),
            gregory: "gregory".into(),
        }
    }

    #[test]
    fn regular_patches_use_single_crease_bspline() {
        let config = DrawSourceConfig::for_patch_type(PatchType::Regular, &sources());
        let names: Vec<&str> = config
            .common
            .defines
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, ["OSD_PATCH_BSPLINE", "OSD_PATCH_ENABLE_SINGLE_CREASE"]);
        assert_eq!(config.vertex_shader.source, "bspline");
        assert_eq!(config.hull_shader.entry_point, "hs_main_patches");
        assert_eq!(config.domain_shader.target, "ds_5_0");
    }

    #[test]
    fn gregory_boundary_defines_on_common_and_stages() {
        let config = DrawSourceConfig::for_patch_type(PatchType::GregoryBoundary, &sources());
        assert!(config
            .common
            .defines
            .iter()
            .any(|(n, _)| n == "OSD_PATCH_GREGORY_BOUNDARY"));
        for section in [
            &config.vertex_shader,
            &config.hull_shader,
            &config.domain_shader,
        ] {
            assert!(section
                .defines
                .iter()
                .any(|(n, _)| n == "OSD_PATCH_GREGORY_BOUNDARY"));
        }
    }

    #[test]
    fn gregory_basis_has_no_tessellation_stages() {
        let config = DrawSourceConfig::for_patch_type(PatchType::GregoryBasis, &sources());
        assert!(config.vertex_shader.is_empty());
        assert!(config.hull_shader.is_empty());
        assert!(config.domain_shader.is_empty());

        let mut compiler = RecordingCompiler::default();
        let mut registry = DrawRegistry::new(sources());
        let draw = registry.draw_config(PatchType::GregoryBasis, &mut compiler);
        assert!(draw.vertex_shader.is_none());
        assert!(compiler.compiled.is_empty());
    }

    #[test]
    fn failing_stage_keeps_the_others() {
        let mut compiler = RecordingCompiler {
            fail_hull: true,
            ..Default::default()
        };
        let mut registry = DrawRegistry::new(sources());
        let draw = registry.draw_config(PatchType::Gregory, &mut compiler);
        assert!(draw.vertex_shader.is_some());
        assert!(draw.hull_shader.is_none());
        assert!(draw.domain_shader.is_some());
        assert_eq!(draw.input_layout.as_deref(), Some(&1));
    }

    #[test]
    fn configurations_are_cached() {
        let mut compiler = RecordingCompiler::default();
        let mut registry = DrawRegistry::new(sources());
        registry.draw_config(PatchType::Regular, &mut compiler);
        registry.draw_config(PatchType::Regular, &mut compiler);
        assert_eq!(compiler.compiled.len(), 3);
    }

    #[test]
    fn input_layout_is_created_once_and_shared() {
        let mut compiler = RecordingCompiler::default();
        let mut registry = DrawRegistry::new(sources());
        for patch_type in [
            PatchType::Regular,
            PatchType::Gregory,
            PatchType::GregoryBoundary,
        ] {
            let draw = registry.draw_config(patch_type, &mut compiler);
            assert!(draw.input_layout.is_some(), "{patch_type:?}");
        }
        assert_eq!(compiler.layouts_built, 1);
        assert!(registry.input_layout().is_some());
    }
}
