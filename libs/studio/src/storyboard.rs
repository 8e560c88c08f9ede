//! Storyboard editor model
//!
//! Each scene carries the image currently shown and the image it was created
//! with. AI edits replace the current image; reverting restores the original,
//! which itself never changes.

use serde::Serialize;
use tracing::info;

use crate::client::SceneImageApi;
use crate::error::{StudioError, StudioResult};
use crate::wire::SceneImageRequest;

pub const MIN_SCENE_SECONDS: u32 = 1;
pub const MAX_SCENE_SECONDS: u32 = 60;
pub const DEFAULT_SCENE_SECONDS: u32 = 12;

/// A storyboard tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardScene {
    id: u32,
    pub name: String,
    pub seconds: u32,
    pub prompt: String,
    image: String,
    original_image: String,
}

impl StoryboardScene {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Image currently shown (asset path or data URL)
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Image the scene was created with
    pub fn original_image(&self) -> &str {
        &self.original_image
    }

    pub fn is_modified(&self) -> bool {
        self.image != self.original_image
    }
}

/// Editable text of a scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDetails {
    pub name: String,
    pub seconds: u32,
    pub prompt: String,
}

impl SceneDetails {
    fn validate(&self) -> StudioResult<()> {
        if self.name.trim().is_empty() {
            return Err(StudioError::validation("Scene name is required"));
        }
        if !(MIN_SCENE_SECONDS..=MAX_SCENE_SECONDS).contains(&self.seconds) {
            return Err(StudioError::validation(format!(
                "Duration must be between {} and {} seconds",
                MIN_SCENE_SECONDS, MAX_SCENE_SECONDS
            )));
        }
        Ok(())
    }
}

/// Render state shown in the rendering queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    Processing,
    Queued,
    Pending,
}

/// One row of the rendering queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderItem {
    pub scene_id: u32,
    pub name: String,
    pub seconds: u32,
    pub state: RenderState,
}

/// Name, image and prompt of the editor's starting scenes
const DEFAULT_SCENES: [(&str, &str, &str); 8] = [
    (
        "scene01_intro",
        "assets/storyboard/scene-1.jpg",
        "Pixar-quality intro inside a bustling open-plan office of colorful monsters. Max, a chubby purple monster in a pinstripe vest and tie, types furiously on an outdated beige keyboard.",
    ),
    (
        "scene02_breakdown",
        "assets/storyboard/scene-2.jpeg",
        "Close-ups of Max's ancient hardware struggling: dusty fans wheeze, loading bars crawl, a retro printer spits out an error page.",
    ),
    (
        "scene03_discovery",
        "assets/storyboard/scene-3.jpg",
        "Moody hallway transition as Max trudges along until a glowing white cube with purple light floats between his legs and opens to reveal a radiant key.",
    ),
    (
        "scene04_transformation",
        "assets/storyboard/scene-4.jpeg",
        "Energetic montage back at Max's desk powered by the cube. Holographic monitors blaze, renders complete instantly, coworkers cheer and high-five.",
    ),
    (
        "scene05_discovery_detail",
        "assets/storyboard/scene-5.jpeg",
        "Close-up of Max examining the glowing cube with wonder, purple reflections dancing across his face as particles float around him.",
    ),
    (
        "scene06_typing",
        "assets/storyboard/scene-6.jpeg",
        "Max's hands typing rapidly with renewed energy, holographic code and data streams flowing around in purple and blue light.",
    ),
    (
        "scene07_presentation",
        "assets/storyboard/scene-7.jpeg",
        "Wide shot of an elegant office with Max standing confidently, warm sunlight streaming through the windows, monster coworkers in the background.",
    ),
    (
        "scene08_victory",
        "assets/storyboard/scene-8.jpeg",
        "Triumphant conference room finale. Max presents crisp printouts to an applauding monster team around a reflective glass table.",
    ),
];

/// Scenes in play order
#[derive(Debug, Clone, Default)]
pub struct Storyboard {
    scenes: Vec<StoryboardScene>,
    next_id: u32,
}

impl Storyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The editor's starting storyboard: eight named 12 second scenes
    pub fn with_defaults() -> Self {
        let mut board = Self::new();
        for (name, image, prompt) in DEFAULT_SCENES {
            let id = board.add_scene(prompt, image);
            if let Some(scene) = board.scene_mut(id) {
                scene.name = name.to_string();
            }
        }
        board
    }

    pub fn scenes(&self) -> &[StoryboardScene] {
        &self.scenes
    }

    pub fn scene(&self, id: u32) -> Option<&StoryboardScene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Append a scene showing `image`; it becomes the scene's revert target
    pub fn add_scene(&mut self, prompt: impl Into<String>, image: impl Into<String>) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        let image = image.into();
        self.scenes.push(StoryboardScene {
            id,
            name: format!("scene{:02}", id),
            seconds: DEFAULT_SCENE_SECONDS,
            prompt: prompt.into(),
            original_image: image.clone(),
            image,
        });
        id
    }

    /// Replace a scene's name, duration and prompt
    ///
    /// Returns `Ok(false)` when the scene does not exist.
    pub fn update_details(&mut self, id: u32, details: SceneDetails) -> StudioResult<bool> {
        details.validate()?;
        let Some(scene) = self.scene_mut(id) else {
            return Ok(false);
        };
        scene.name = details.name.trim().to_string();
        scene.seconds = details.seconds;
        scene.prompt = details.prompt;
        Ok(true)
    }

    /// Show `image` instead of the current image
    pub fn apply_image(&mut self, id: u32, image: impl Into<String>) -> bool {
        match self.scene_mut(id) {
            Some(scene) => {
                scene.image = image.into();
                true
            }
            None => false,
        }
    }

    /// Restore the original image; returns whether the image changed
    pub fn revert(&mut self, id: u32) -> bool {
        let Some(scene) = self.scene_mut(id) else {
            return false;
        };
        if !scene.is_modified() {
            return false;
        }
        scene.image = scene.original_image.clone();
        true
    }

    /// Total running time, in seconds
    pub fn total_seconds(&self) -> u32 {
        self.scenes.iter().map(|s| s.seconds).sum()
    }

    /// Queue view of a submitted storyboard
    ///
    /// The first scene renders, the next two wait in the queue and the rest
    /// are pending.
    pub fn render_queue(&self) -> Vec<RenderItem> {
        self.scenes
            .iter()
            .enumerate()
            .map(|(index, scene)| RenderItem {
                scene_id: scene.id,
                name: scene.name.clone(),
                seconds: scene.seconds,
                state: match index {
                    0 => RenderState::Processing,
                    1 | 2 => RenderState::Queued,
                    _ => RenderState::Pending,
                },
            })
            .collect()
    }

    /// Ask the image engine for a new image and apply it with `details`
    ///
    /// Nothing changes when the request fails.
    pub async fn regenerate_scene<A>(
        &mut self,
        api: &A,
        id: u32,
        details: SceneDetails,
        request: &SceneImageRequest,
    ) -> StudioResult<()>
    where
        A: SceneImageApi + ?Sized,
    {
        details.validate()?;
        if self.scene(id).is_none() {
            return Err(StudioError::validation("Scene not found"));
        }

        let image = api.generate_scene_image(request).await?;
        info!(
            "Scene {} image updated (edit: {})",
            id,
            request.change_instruction.is_some()
        );

        self.apply_image(id, image);
        self.update_details(id, details)?;
        Ok(())
    }

    fn scene_mut(&mut self, id: u32) -> Option<&mut StoryboardScene> {
        self.scenes.iter_mut().find(|s| s.id == id)
    }
}

impl SceneImageRequest {
    /// Request a brand-new image from `prompt`
    pub fn generate(prompt: impl Into<String>) -> StudioResult<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(StudioError::validation("Please describe the scene"));
        }
        Ok(Self {
            prompt,
            change_instruction: None,
            existing_image_base64: None,
        })
    }

    /// Request an edit of `existing_image` (a data URL) following `instruction`
    pub fn change(
        prompt: impl Into<String>,
        instruction: impl Into<String>,
        existing_image: impl Into<String>,
    ) -> StudioResult<Self> {
        let instruction = instruction.into();
        if instruction.trim().is_empty() {
            return Err(StudioError::validation("Please describe the change"));
        }
        let existing_image = existing_image.into();
        if !existing_image.starts_with("data:image/") {
            return Err(StudioError::validation(
                "The current image must be sent as a data URL",
            ));
        }
        Ok(Self {
            prompt: prompt.into(),
            change_instruction: Some(instruction),
            existing_image_base64: Some(existing_image),
        })
    }
}
