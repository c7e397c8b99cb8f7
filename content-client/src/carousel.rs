/// Курсор по избранным публикациям с переходом по кругу.
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel<T> {
    items: Vec<T>,
    active: usize,
}

impl<T> Carousel<T> {
    /// Курсор на первом элементе; `None` для пустого списка.
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self { items, active: 0 })
    }

    /// Текущий элемент.
    pub fn active(&self) -> &T {
        &self.items[self.active]
    }

    /// Индекс текущего элемента.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Все элементы.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Нужны ли стрелки и точки навигации.
    pub fn has_controls(&self) -> bool {
        self.items.len() > 1
    }

    /// Следующий элемент, после последнего снова первый.
    pub fn next(&mut self) -> &T {
        self.active = (self.active + 1) % self.items.len();
        self.active()
    }

    /// Предыдущий элемент, перед первым последний.
    pub fn prev(&mut self) -> &T {
        self.active = (self.active + self.items.len() - 1) % self.items.len();
        self.active()
    }

    /// Переход к элементу по индексу; индекс вне диапазона игнорируется.
    pub fn select(&mut self, index: usize) -> &T {
        if index < self.items.len() {
            self.active = index;
        }
        self.active()
    }
}
