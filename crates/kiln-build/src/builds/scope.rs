//! Scope guards for the active module and compilation options

use super::Build;
use crate::state::SavedState;
use std::ops::{Deref, DerefMut};

/// Active-module scope; the previously active module is restored on drop
pub struct ModuleScope<'a> {
    build: &'a mut Build,
    previous: usize,
}

impl<'a> ModuleScope<'a> {
    pub(super) fn new(build: &'a mut Build, previous: usize) -> Self {
        Self { build, previous }
    }
}

impl Deref for ModuleScope<'_> {
    type Target = Build;

    fn deref(&self) -> &Build {
        self.build
    }
}

impl DerefMut for ModuleScope<'_> {
    fn deref_mut(&mut self) -> &mut Build {
        self.build
    }
}

impl Drop for ModuleScope<'_> {
    fn drop(&mut self) {
        self.build.modules.set_active(self.previous);
    }
}

/// Options scope; every attribute the options touched is restored on drop
pub struct OptionsScope<'a> {
    build: &'a mut Build,
    saved: Option<SavedState>,
}

impl<'a> OptionsScope<'a> {
    pub(super) fn new(build: &'a mut Build, saved: SavedState) -> Self {
        Self {
            build,
            saved: Some(saved),
        }
    }
}

impl Deref for OptionsScope<'_> {
    type Target = Build;

    fn deref(&self) -> &Build {
        self.build
    }
}

impl DerefMut for OptionsScope<'_> {
    fn deref_mut(&mut self) -> &mut Build {
        self.build
    }
}

impl Drop for OptionsScope<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.build.state.restore(saved);
        }
    }
}
