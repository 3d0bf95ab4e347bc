/// Surfaces user-visible messages: `window.alert` in a browser.
pub trait Notifier {
    fn alert(&self, message: &str);
}
