/// Vector-backed LIFO used for the value and operator stacks.
///
/// `pop` and `peek` return `None` on an empty stack; the evaluator turns that
/// into an [`EvaluationError`](super::EvaluationError).
#[derive(Debug, Clone)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Stack { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Drops every element but keeps the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_reverse_push_order() {
        let mut stack = Stack::new();
        stack.push(1.0);
        stack.push(2.0);
        assert_eq!(stack.peek(), Some(&2.0));
        assert_eq!(stack.pop(), Some(2.0));
        assert_eq!(stack.pop(), Some(1.0));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn clear_empties_the_stack() {
        let mut stack = Stack::new();
        stack.push('a');
        stack.push('b');
        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
        assert_eq!(stack.peek(), None);
    }
}
