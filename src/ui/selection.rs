/// Labelled list of toggle buttons, one of which is active
use iced::widget::{button, column, text, Column, Row};
use iced::Element;

/// One entry of a selection list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionItem<T> {
    pub label: String,
    pub value: T,
}

impl<T> SelectionItem<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Build a selection list; `on_press` maps the chosen value to a message
pub fn selection_list<'a, T, Message>(
    label: &'a str,
    items: Vec<SelectionItem<T>>,
    active: &T,
    on_press: impl Fn(T) -> Message,
) -> Element<'a, Message>
where
    T: PartialEq + Clone + 'a,
    Message: Clone + 'a,
{
    let buttons = items.into_iter().map(|item| {
        let is_active = item.value == *active;
        button(text(item.label).size(14))
            .padding([6, 10])
            .style(if is_active { button::primary } else { button::secondary })
            .on_press(on_press(item.value))
            .into()
    });

    let content: Column<'a, Message> = column![
        text(label).size(16),
        Row::with_children(buttons).spacing(6).wrap(),
    ]
    .spacing(5);

    content.into()
}
