#[derive(Debug, Clone)]
pub struct CsvSettings {
    pub delimiter: char,
    /// Strip leading whitespace from every field.
    pub trim_leading_space: bool,
}

impl CsvSettings {
    pub fn new(delimiter: char) -> Self {
        CsvSettings {
            delimiter,
            trim_leading_space: true,
        }
    }

    pub fn tab_separated() -> Self {
        Self::new('\t')
    }
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self::new(',')
    }
}
