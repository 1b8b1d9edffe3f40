//! Renderer-agnostic debug geometry for IK chains.
//!
//! Chains and targets are collected into a plain line buffer a renderer can
//! drain each frame. Nothing in the pipeline depends on this hook; it is
//! off by default.

use bevy::math::Vec3;
use bevy::prelude::Resource;

use marionette_core::math::vec_from_na;

use crate::binding::ChainArena;

const CHAIN_COLOR: [f32; 4] = [0.2, 0.9, 0.3, 1.0];
const TARGET_COLOR: [f32; 4] = [0.9, 0.2, 0.2, 1.0];
const TARGET_CROSS_HALF: f32 = 0.05;

/// A single colored line segment in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: [f32; 4],
}

/// Collected debug lines for the current frame.
#[derive(Resource, Debug, Default)]
pub struct DebugGeometry {
    lines: Vec<DebugLine>,
}

impl DebugGeometry {
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn push_line(&mut self, start: Vec3, end: Vec3, color: [f32; 4]) {
        self.lines.push(DebugLine { start, end, color });
    }

    pub fn lines(&self) -> &[DebugLine] {
        &self.lines
    }
}

/// Controls debug-geometry collection.
#[derive(Resource, Debug, Clone, Default)]
pub struct DebugDrawConfig {
    pub enabled: bool,
    /// Forwarded to the consuming renderer; collection itself ignores it.
    pub depth_test: bool,
}

/// Collect chain segments and target crosses for every bound chain.
///
/// Uses each chain's last blended pose, so it reflects what was actually
/// written back this pass.
pub fn collect_debug_geometry(arena: &ChainArena, buffer: &mut DebugGeometry) {
    buffer.clear();
    for state in arena.iter() {
        let pose = &state.blended;
        for i in 0..pose.len().saturating_sub(1) {
            buffer.push_line(
                vec_from_na(&pose[i].position),
                vec_from_na(&pose[i + 1].position),
                CHAIN_COLOR,
            );
        }

        if let Some(goal) = &state.goal {
            let center = vec_from_na(&goal.position);
            for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                buffer.push_line(
                    center - axis * TARGET_CROSS_HALF,
                    center + axis * TARGET_CROSS_HALF,
                    TARGET_COLOR,
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
