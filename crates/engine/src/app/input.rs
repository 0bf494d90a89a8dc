#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Jump,
    Sprint,
    DebugKill,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveLeft => 0,
            InputAction::MoveRight => 1,
            InputAction::Jump => 2,
            InputAction::Sprint => 3,
            InputAction::DebugKill => 4,
        }
    }
}

/// Input state sampled once per fixed tick.
///
/// Held actions stay set while the key is down; `pause_pressed` and
/// `quit_pressed` are edges that are true for exactly one tick per press.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    pause_pressed: bool,
    quit_pressed: bool,
    actions: ActionStates,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        pause_pressed: bool,
        quit_pressed: bool,
        actions: ActionStates,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            pause_pressed,
            quit_pressed,
            actions,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn pause_pressed(&self) -> bool {
        self.pause_pressed
    }

    pub fn quit_pressed(&self) -> bool {
        self.quit_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// -1 for left, 1 for right, 0 when neither or both are held.
    pub fn horizontal_direction(&self) -> i32 {
        let left = self.is_down(InputAction::MoveLeft);
        let right = self.is_down(InputAction::MoveRight);
        match (left, right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_pause_pressed(mut self, pause_pressed: bool) -> Self {
        self.pause_pressed = pause_pressed;
        self
    }

    pub fn with_quit_pressed(mut self, quit_pressed: bool) -> Self {
        self.quit_pressed = quit_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}
