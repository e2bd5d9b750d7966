use crate::models::GenerationRequest;

/// Appended to every prompt so all images of a batch share one look.
pub const STYLE_DIRECTIVES: &str = "neutral studio lighting, plain light grey background, \
consistent product photography style, sharp focus, high detail, suitable as a 3D modeling reference";

const IMAGE_ONLY_SUBJECT: &str = "a variation of the jewelry piece shown in the reference image";
const REFERENCE_GUIDANCE: &str = "keep the overall design language of the reference piece";

/// Final prompt text sent to the model.
pub fn compose_prompt(request: &GenerationRequest) -> String {
    let has_reference = request.reference_image().is_some();
    let mut parts: Vec<String> = Vec::with_capacity(5);

    match request.prompt() {
        Some(prompt) => {
            parts.push(prompt.trim_end_matches(|c: char| c == ',' || c == '.').to_string());
            if has_reference {
                parts.push(REFERENCE_GUIDANCE.to_string());
            }
        }
        None => parts.push(IMAGE_ONLY_SUBJECT.to_string()),
    }

    if let Some(style) = request.style_tag() {
        parts.push(format!("{} style", style));
    }

    parts.push(request.angle_hint().to_string());
    parts.push(STYLE_DIRECTIVES.to_string());
    parts.join(", ")
}
