/// Open/closed state of the language dropdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LanguagePicker {
    #[default]
    Closed,
    Open,
}

impl LanguagePicker {
    pub fn toggled(self) -> LanguagePicker {
        match self {
            LanguagePicker::Closed => LanguagePicker::Open,
            LanguagePicker::Open => LanguagePicker::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, LanguagePicker::Open)
    }
}
