/// Control actions an observer can return to the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the session and return the trajectory so far.
    StopEarly,
}
