use super::models::SampleDraft;
use crate::identifiers::generate_plot_id;
use rand::Rng;

/// Initial values for a sample added after `previous`.
///
/// Agronomic context (field, crops, yields, lime history, program level,
/// organic flag, optional tests) carries forward. Physical identity does not:
/// the plot id is always freshly generated and name/zone start empty.
pub fn resolve_defaults<R: Rng + ?Sized>(
    previous: Option<&SampleDraft>,
    rng: &mut R,
) -> SampleDraft {
    let plot_id = generate_plot_id(rng);

    let Some(previous) = previous else {
        return SampleDraft {
            plot_id,
            ..SampleDraft::default()
        };
    };

    SampleDraft {
        field_id: previous.field_id,
        sample_name: String::new(),
        zone: String::new(),
        plot_id,
        crop: previous.crop.clone(),
        yield_goal: previous.yield_goal.clone(),
        previous_crop: previous.previous_crop.clone(),
        previous_crop_yield: previous.previous_crop_yield.clone(),
        lime_history: previous.lime_history.clone(),
        program_level: previous.program_level,
        organic: previous.organic,
        // Only optional flags are stored, standard tests stay on
        tests: previous.tests,
        ..SampleDraft::default()
    }
}
