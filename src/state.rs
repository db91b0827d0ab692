// Represents the current high-level state of the application UI
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    Initialising, // App is starting, spawning the request worker
    Running,      // Main operational state, showing the service widgets
    About,        // Showing the about screen
}
