use std::borrow::Cow;
use warren_derive::warren_error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// Two variants wrap the same source type, so no `From<BoxError>` is generated
// and the conflicting-impl error never appears.
#[warren_error]
pub enum LaneError {
    #[error("Lost{}: {source}", format_context(.context))]
    Lost { source: BoxError, context: Option<Cow<'static, str>> },

    #[error("Rejected{}: {source}", format_context(.context))]
    Rejected { source: BoxError, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = LaneError::Lost { source: "gone".into(), context: None };
    assert_eq!(err.to_string(), "Lost: gone");
}
