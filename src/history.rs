use crate::models::Category;

/// Where the app currently is: a category listing or a story's comment view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Feed(Category),
    Story(u64),
}

/// Back/forward navigation over routes, the in-app stand-in for browser
/// history. Navigating somewhere new pushes the current route onto the back
/// stack and clears the forward stack.
pub struct NavHistory {
    back: Vec<Route>,
    current: Route,
    forward: Vec<Route>,
}

impl NavHistory {
    pub fn new(initial: Route) -> Self {
        Self {
            back: Vec::new(),
            current: initial,
            forward: Vec::new(),
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Navigate to a new route. Navigating to the current route is a no-op.
    pub fn push(&mut self, route: Route) {
        if route == self.current {
            return;
        }
        self.back.push(self.current);
        self.current = route;
        self.forward.clear();
    }

    pub fn back(&mut self) -> Option<Route> {
        let previous = self.back.pop()?;
        self.forward.push(self.current);
        self.current = previous;
        Some(previous)
    }

    pub fn forward(&mut self) -> Option<Route> {
        let next = self.forward.pop()?;
        self.back.push(self.current);
        self.current = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_and_forward_round_trip() {
        let mut history = NavHistory::new(Route::Feed(Category::Top));
        history.push(Route::Feed(Category::New));
        history.push(Route::Story(42));

        assert_eq!(history.back(), Some(Route::Feed(Category::New)));
        assert_eq!(history.back(), Some(Route::Feed(Category::Top)));
        assert_eq!(history.back(), None);

        assert_eq!(history.forward(), Some(Route::Feed(Category::New)));
        assert_eq!(history.forward(), Some(Route::Story(42)));
        assert_eq!(history.forward(), None);
        assert_eq!(history.current(), Route::Story(42));
    }

    #[test]
    fn push_clears_forward_stack() {
        let mut history = NavHistory::new(Route::Feed(Category::Top));
        history.push(Route::Story(1));
        history.back();
        assert!(history.can_go_forward());

        history.push(Route::Story(2));
        assert!(!history.can_go_forward());
        assert_eq!(history.current(), Route::Story(2));
    }

    #[test]
    fn pushing_current_route_is_a_noop() {
        let mut history = NavHistory::new(Route::Feed(Category::Top));
        history.push(Route::Feed(Category::Top));
        assert!(!history.can_go_back());
    }
}
