//! Prompt construction and proposal extraction.

use carpool_core::{AdvisorError, AdvisorProposal, AdvisorRequest, WeightVector};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ProposalPayload {
    weights: WeightVector,
    justification: String,
    confidence: f64,
}

/// Render the advisor prompt for `request`.
///
/// # Errors
///
/// Returns [`AdvisorError::Unavailable`] if the request cannot be encoded.
pub fn build_prompt(request: &AdvisorRequest) -> Result<String, AdvisorError> {
    let encode = |err: serde_json::Error| AdvisorError::Unavailable {
        message: format!("could not encode advisor request: {err}"),
    };
    let weights = serde_json::to_string(&request.current_weights).map_err(encode)?;
    let history = serde_json::to_string_pretty(&request.aggregated_history).map_err(encode)?;
    Ok(format!(
        "You tune the scoring weights of a carpool route planner. Each route is scored as \
         time * w.time + distance * w.distance + reliability * w.reliability over metrics \
         normalised to [0, 1].\n\n\
         Current weights:\n{weights}\n\n\
         Aggregated outcome history (deviations are actual minus planned; correlations relate \
         each weight to relative deviation):\n{history}\n\n\
         Propose new weights that would reduce deviation from plan. Each weight must be in \
         [0, 1] and the three must sum to 1. Reply with a single JSON object of the form \
         {{\"weights\": {{\"time\": number, \"distance\": number, \"reliability\": number}}, \
         \"justification\": string, \"confidence\": number between 0 and 1}}."
    ))
}

/// Extract the proposal from advisor output.
///
/// Text before the first `{` is skipped and parsing stops at the end of the
/// first JSON value, so prose around the object is tolerated. Weights are
/// returned as given; a confidence outside `[0, 1]` is clamped.
///
/// # Errors
///
/// Returns [`AdvisorError::MalformedResponse`] when no proposal object can
/// be read or the confidence is not a finite number.
///
/// # Examples
///
/// ```
/// use carpool_data::advisor::parse_proposal;
///
/// let content = r#"Sure. {"weights": {"time": 0.5, "distance": 0.25, "reliability": 0.25},
///     "justification": "late arrivals dominate", "confidence": 0.7} Hope this helps."#;
/// let proposal = parse_proposal(content).expect("proposal");
/// assert_eq!(proposal.proposed_weights.time, 0.5);
/// assert_eq!(proposal.justification, "late arrivals dominate");
/// ```
pub fn parse_proposal(content: &str) -> Result<AdvisorProposal, AdvisorError> {
    let malformed = |message: String| AdvisorError::MalformedResponse { message };
    let tail = content
        .find('{')
        .and_then(|start| content.get(start..))
        .ok_or_else(|| malformed("no JSON object in advisor output".to_owned()))?;
    let payload = serde_json::Deserializer::from_str(tail)
        .into_iter::<ProposalPayload>()
        .next()
        .ok_or_else(|| malformed("no JSON object in advisor output".to_owned()))?
        .map_err(|err| malformed(format!("invalid proposal object: {err}")))?;
    if !payload.confidence.is_finite() {
        return Err(malformed("confidence is not a finite number".to_owned()));
    }
    Ok(AdvisorProposal {
        proposed_weights: payload.weights,
        justification: payload.justification,
        confidence: payload.confidence.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpool_core::{MetricWeights, PerformanceAnalysis};
    use rstest::rstest;

    #[rstest]
    fn prompt_embeds_current_weights() {
        let request = AdvisorRequest {
            current_weights: MetricWeights::default(),
            aggregated_history: PerformanceAnalysis::default(),
        };
        let prompt = build_prompt(&request).expect("prompt");
        assert!(prompt.contains(r#"{"time":0.4,"distance":0.3,"reliability":0.3}"#));
        assert!(prompt.contains("routesAnalyzed"));
    }

    #[rstest]
    fn bare_object_parses() {
        let proposal = parse_proposal(
            r#"{"weights":{"time":0.3,"distance":0.3,"reliability":0.4},"justification":"j","confidence":1.4}"#,
        )
        .expect("proposal");
        assert_eq!(proposal.proposed_weights, WeightVector::new(0.3, 0.3, 0.4));
        assert_eq!(proposal.confidence, 1.0);
    }

    #[rstest]
    fn invalid_weights_are_passed_through_for_validation() {
        let proposal = parse_proposal(
            r#"{"weights":{"time":0.9,"distance":0.9,"reliability":-0.1},"justification":"j","confidence":0.2}"#,
        )
        .expect("proposal");
        assert_eq!(proposal.proposed_weights.reliability, -0.1);
    }

    #[rstest]
    #[case("I cannot help with that.")]
    #[case(r#"{"weights": {"time": 0.5}, "justification": "partial"}"#)]
    #[case(r#"{"weights": "#)]
    fn unusable_output_is_malformed(#[case] content: &str) {
        let err = parse_proposal(content).expect_err("malformed");
        assert!(matches!(err, AdvisorError::MalformedResponse { .. }));
    }
}
