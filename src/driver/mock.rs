//! Resource-counting test double for [`Driver`].
//!
//! "Compilation" is a crude line check that is good enough to tell valid
//! test shaders from ones with a missing semicolon. Uniform locations are
//! reflected from `uniform <type> <name>;` declarations at link time.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use super::{
    Driver, DriverError, ProgramId, StageId, StageKind, TextureId, UniformLocation, UniformValue,
};
use crate::compute::Vertex;

#[derive(Debug)]
struct MockStage {
    kind: StageKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct MockProgram {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    stages: HashMap<u32, MockStage>,
    programs: HashMap<u32, MockProgram>,
    textures: HashMap<u32, (u32, u32, Vec<u8>)>,
    current_program: Option<u32>,
    bound_textures: BTreeMap<u32, u32>,
    uniforms_set: Vec<(String, UniformValue)>,
    stages_created: usize,
    invalid_deletes: usize,
    draws: usize,
    viewport: Option<(u32, u32)>,
    fail_link: bool,
    framebuffer: Option<Vec<u8>>,
}

impl MockState {
    fn allocate(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::new(self.next_id).expect("ids start at 1")
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockDriver {
    state: RefCell<MockState>,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent link fail with a driver log.
    pub(crate) fn fail_links(&self, fail: bool) {
        self.state.borrow_mut().fail_link = fail;
    }

    /// Bytes returned by the next `read_pixels` calls.
    pub(crate) fn set_framebuffer(&self, pixels: Vec<u8>) {
        self.state.borrow_mut().framebuffer = Some(pixels);
    }

    pub(crate) fn live_stages(&self) -> usize {
        self.state.borrow().stages.len()
    }

    pub(crate) fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub(crate) fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub(crate) fn stages_created(&self) -> usize {
        self.state.borrow().stages_created
    }

    pub(crate) fn invalid_deletes(&self) -> usize {
        self.state.borrow().invalid_deletes
    }

    pub(crate) fn attached_count(&self, program: &ProgramId) -> usize {
        self.state
            .borrow()
            .programs
            .get(&program.raw().get())
            .map_or(0, |p| p.attached.len())
    }

    pub(crate) fn current_program(&self) -> Option<u32> {
        self.state.borrow().current_program
    }

    pub(crate) fn bound_texture(&self, unit: u32) -> Option<u32> {
        self.state.borrow().bound_textures.get(&unit).copied()
    }

    pub(crate) fn texture_size(&self, texture: &TextureId) -> Option<(u32, u32)> {
        self.state
            .borrow()
            .textures
            .get(&texture.raw().get())
            .map(|(w, h, _)| (*w, *h))
    }

    /// Uniform values set so far, by name, in call order.
    pub(crate) fn uniforms_set(&self) -> Vec<(String, UniformValue)> {
        self.state.borrow().uniforms_set.clone()
    }

    pub(crate) fn draws(&self) -> usize {
        self.state.borrow().draws
    }

    pub(crate) fn last_viewport(&self) -> Option<(u32, u32)> {
        self.state.borrow().viewport
    }
}

fn check_source(source: &str) -> Result<(), String> {
    if !source.contains("main") {
        return Err("0:0: error: no main() function found".to_string());
    }
    let mut depth: i64 = 0;
    for (i, raw) in source.lines().enumerate() {
        let line = raw.trim();
        depth += line.matches('{').count() as i64;
        depth -= line.matches('}').count() as i64;
        if depth < 0 {
            return Err(format!("0:{}: error: unexpected '}}'", i + 1));
        }
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let terminated = line.ends_with(';') || line.ends_with('{') || line.ends_with('}');
        let header = line.ends_with(')') && !line.contains('=');
        if !terminated && !header {
            return Err(format!("0:{}: error: syntax error, expected ';'", i + 1));
        }
    }
    if depth != 0 {
        return Err("0:0: error: unexpected end of file".to_string());
    }
    Ok(())
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let decl = line.trim().strip_prefix("uniform ")?;
        let decl = decl.trim_end_matches(';');
        decl.split_whitespace().last().map(str::to_string)
    })
}

impl Driver for MockDriver {
    fn create_program(&self) -> Result<ProgramId, DriverError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.programs.insert(id.get(), MockProgram::default());
        Ok(ProgramId::from_raw(id))
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.raw().get()).is_none() {
            state.invalid_deletes += 1;
        }
    }

    fn create_stage(&self, kind: StageKind) -> Result<StageId, DriverError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.stages.insert(
            id.get(),
            MockStage {
                kind,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.stages_created += 1;
        Ok(StageId::from_raw(id))
    }

    fn compile_stage(&self, stage: &StageId, source: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(s) = state.stages.get_mut(&stage.raw().get()) {
            s.source = source.to_string();
            match check_source(source) {
                Ok(()) => {
                    s.compiled = true;
                    s.log.clear();
                }
                Err(log) => {
                    s.compiled = false;
                    s.log = log;
                }
            }
        }
    }

    fn compile_status(&self, stage: &StageId) -> bool {
        self.state
            .borrow()
            .stages
            .get(&stage.raw().get())
            .is_some_and(|s| s.compiled)
    }

    fn stage_info_log(&self, stage: &StageId) -> String {
        self.state
            .borrow()
            .stages
            .get(&stage.raw().get())
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_stage(&self, stage: StageId) {
        let mut state = self.state.borrow_mut();
        if state.stages.remove(&stage.raw().get()).is_none() {
            state.invalid_deletes += 1;
        }
    }

    fn attach_stage(&self, program: &ProgramId, stage: &StageId) {
        let mut state = self.state.borrow_mut();
        if let Some(p) = state.programs.get_mut(&program.raw().get()) {
            p.attached.push(stage.raw().get());
        }
    }

    fn detach_stage(&self, program: &ProgramId, stage: &StageId) {
        let mut state = self.state.borrow_mut();
        if let Some(p) = state.programs.get_mut(&program.raw().get()) {
            p.attached.retain(|&id| id != stage.raw().get());
        }
    }

    fn link_program(&self, program: &ProgramId) {
        let mut state = self.state.borrow_mut();
        let fail_link = state.fail_link;
        let Some(attached) = state
            .programs
            .get(&program.raw().get())
            .map(|p| p.attached.clone())
        else {
            return;
        };

        let stages: Vec<&MockStage> = attached
            .iter()
            .filter_map(|id| state.stages.get(id))
            .collect();
        let has = |kind: StageKind| stages.iter().any(|s| s.kind == kind && s.compiled);
        let result = if fail_link {
            Err("error: varying FragTex not written by vertex shader".to_string())
        } else if !has(StageKind::Vertex) || !has(StageKind::Fragment) {
            Err("error: program needs a compiled vertex and fragment stage".to_string())
        } else {
            let mut uniforms: Vec<String> = Vec::new();
            for name in stages.iter().flat_map(|s| declared_uniforms(&s.source)) {
                if !uniforms.contains(&name) {
                    uniforms.push(name);
                }
            }
            Ok(uniforms)
        };

        if let Some(p) = state.programs.get_mut(&program.raw().get()) {
            match result {
                Ok(uniforms) => {
                    p.linked = true;
                    p.log.clear();
                    p.uniforms = uniforms;
                }
                Err(log) => {
                    p.linked = false;
                    p.log = log;
                    p.uniforms.clear();
                }
            }
        }
    }

    fn link_status(&self, program: &ProgramId) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program.raw().get())
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: &ProgramId) -> String {
        self.state
            .borrow()
            .programs
            .get(&program.raw().get())
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<&ProgramId>) {
        self.state.borrow_mut().current_program = program.map(|p| p.raw().get());
    }

    fn uniform_location(&self, program: &ProgramId, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let p = state.programs.get(&program.raw().get())?;
        if !p.linked {
            return None;
        }
        p.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation::from_raw(i as u32))
    }

    fn set_uniform(&self, location: Option<UniformLocation>, value: UniformValue) {
        let Some(location) = location else {
            return;
        };
        let mut state = self.state.borrow_mut();
        let name = state
            .current_program
            .and_then(|id| state.programs.get(&id))
            .and_then(|p| p.uniforms.get(location.raw() as usize))
            .cloned();
        if let Some(name) = name {
            state.uniforms_set.push((name, value));
        }
    }

    fn create_texture(&self) -> Result<TextureId, DriverError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.textures.insert(id.get(), (0, 0, Vec::new()));
        Ok(TextureId::from_raw(id))
    }

    fn upload_texture(&self, texture: &TextureId, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        if let Some(t) = state.textures.get_mut(&texture.raw().get()) {
            *t = (width, height, pixels.to_vec());
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<&TextureId>) {
        let mut state = self.state.borrow_mut();
        match texture {
            Some(t) => {
                state.bound_textures.insert(unit, t.raw().get());
            }
            None => {
                state.bound_textures.remove(&unit);
            }
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture.raw().get()).is_none() {
            state.invalid_deletes += 1;
        }
    }

    fn viewport(&self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }

    fn clear(&self, _color: [f32; 4]) {}

    fn draw_triangles(&self, vertices: &[Vertex]) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        if state.current_program.is_none() {
            return Err(DriverError::Context {
                message: "draw with no program bound".to_string(),
            });
        }
        if vertices.len() % 3 != 0 {
            return Err(DriverError::Context {
                message: format!("{} vertices is not a triangle list", vertices.len()),
            });
        }
        state.draws += 1;
        Ok(())
    }

    fn read_pixels(&self, width: u32, height: u32) -> Result<Vec<u8>, DriverError> {
        let len = width as usize * height as usize * 4;
        match &self.state.borrow().framebuffer {
            Some(pixels) if pixels.len() == len => Ok(pixels.clone()),
            Some(pixels) => Err(DriverError::ReadPixels {
                message: format!("framebuffer holds {} bytes, asked for {}", pixels.len(), len),
            }),
            None => Ok(vec![0; len]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_source_accepts_minimal_main() {
        assert!(check_source("#version 330 core\nvoid main(){}").is_ok());
    }

    #[test]
    fn test_check_source_rejects_missing_semicolon() {
        let err = check_source("void main() {\n    float x = 1.0\n}\n").unwrap_err();
        assert!(err.starts_with("0:2:"), "{}", err);
    }

    #[test]
    fn test_declared_uniforms() {
        let names: Vec<String> =
            declared_uniforms("uniform int width;\n  uniform sampler2D one;\nint x;").collect();
        assert_eq!(names, vec!["width", "one"]);
    }
}
