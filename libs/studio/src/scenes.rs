//! Ordered scene list behind the builder's storyboard preview

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to freshly added scenes
pub const NEW_SCENE_TITLE: &str = "New Scene";

/// Duration given to freshly added scenes, in seconds
pub const NEW_SCENE_DURATION: u32 = 3;

/// One beat of the storyboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: Uuid,
    pub title: String,
    pub visual_direction: String,
    pub text: String,
    /// Seconds
    pub duration: u32,
}

/// A single-field edit of a scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneField {
    Title(String),
    VisualDirection(String),
    Text(String),
    Duration(u32),
}

/// Scenes in storyboard order
///
/// Ids are unique within the store. Operations on unknown ids are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneStore {
    scenes: Vec<Scene>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The builder's starting storyboard
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.push(
            "Hook",
            "Fast-paced product reveal with dynamic camera movement",
            "Ready to level up?",
            3,
        );
        store.push(
            "Problem",
            "Frustrated user struggling with existing solution",
            "Tired of clunky workflows?",
            4,
        );
        store
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Append a blank scene, returning its id
    pub fn add(&mut self) -> Uuid {
        self.push(NEW_SCENE_TITLE, "", "", NEW_SCENE_DURATION)
    }

    /// Append a copy of `id` titled `"<title> (alt)"`
    pub fn duplicate(&mut self, id: Uuid) -> Option<Uuid> {
        let source = self.get(id)?.clone();
        let copy = Scene {
            id: self.fresh_id(),
            title: format!("{} (alt)", source.title),
            ..source
        };
        let new_id = copy.id;
        self.scenes.push(copy);
        Some(new_id)
    }

    /// Delete a scene; returns whether anything was removed
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.scenes.len();
        self.scenes.retain(|s| s.id != id);
        self.scenes.len() != before
    }

    /// Replace one field of a scene; returns whether the scene exists
    pub fn update(&mut self, id: Uuid, field: SceneField) -> bool {
        let Some(scene) = self.scenes.iter_mut().find(|s| s.id == id) else {
            return false;
        };

        match field {
            SceneField::Title(title) => scene.title = title,
            SceneField::VisualDirection(direction) => scene.visual_direction = direction,
            SceneField::Text(text) => scene.text = text,
            SceneField::Duration(duration) => scene.duration = duration,
        }
        true
    }

    /// Sum of every scene's duration, in seconds
    pub fn total_duration(&self) -> u32 {
        self.scenes
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.duration))
    }

    fn push(&mut self, title: &str, visual_direction: &str, text: &str, duration: u32) -> Uuid {
        let id = self.fresh_id();
        self.scenes.push(Scene {
            id,
            title: title.to_string(),
            visual_direction: visual_direction.to_string(),
            text: text.to_string(),
            duration,
        });
        id
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if self.get(id).is_none() {
                return id;
            }
        }
    }
}
