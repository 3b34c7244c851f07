/// Unique identifier of a record (the value of the label column).
/// Examples: `Ahri`, `Excalibur Prime`
pub type Label = String;
/// Name of a feature category as written in the table header.
/// Examples: `Gender`, `Release Year`
pub type CategoryName = String;
/// Raw, unparsed cell value from the source table.
/// Examples: `Female`, `Mid, Support`, `2011`
pub type RawValue = String;
/// Feedback token entered at the input boundary.
/// Examples: `correct`, `partial`, `lower`, `guessed`
pub type FeedbackToken = String;
/// Display name of a game profile, used as the opener book key.
/// Examples: `LolDle`, `Warframedle`
pub type ProfileName = String;
