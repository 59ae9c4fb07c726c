//! Most probable state path decoding for two state hidden Markov models.

/// Log space Viterbi decoder over a two state HMM.
///
/// Probabilities are handed over once at construction and converted to
/// log probabilities, so repeated decoding never underflows. Observations
/// are integer symbols indexing the rows of the emission table.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    init: [f64; 2],
    transition: [[f64; 2]; 2],
    emission: [Vec<f64>; 2],
}

impl ViterbiDecoder {
    /// Builds a decoder from prior, transition and emission probabilities.
    /// Each row of `transition` and `emission` must sum to 1.
    pub fn new(init: [f64; 2], transition: [[f64; 2]; 2], emission: [Vec<f64>; 2]) -> Self {
        Self {
            init: [init[0].ln(), init[1].ln()],
            transition: [
                [transition[0][0].ln(), transition[0][1].ln()],
                [transition[1][0].ln(), transition[1][1].ln()],
            ],
            emission: [
                emission[0].iter().map(|p| p.ln()).collect(),
                emission[1].iter().map(|p| p.ln()).collect(),
            ],
        }
    }

    /// Returns the most likely state path for the given observation
    /// sequence. Ties are broken toward the lower state index. An empty
    /// sequence decodes to an empty path.
    pub fn decode(&self, observations: &[usize]) -> Vec<usize> {
        if observations.is_empty() {
            return Vec::new();
        }

        let alphabet = self.emission[0].len();
        let steps = observations.len();

        // forward pass: best log probability per state, with backpointers
        let mut backtrack = vec![[0usize; 2]; steps];
        let mut scores = [0.0f64; 2];

        let first = observations[0];
        assert!(first < alphabet, "observation {} outside the emission alphabet", first);
        for state in 0..2 {
            scores[state] = self.init[state] + self.emission[state][first];
        }

        for (step, &observation) in observations.iter().enumerate().skip(1) {
            assert!(
                observation < alphabet,
                "observation {} outside the emission alphabet",
                observation
            );
            let mut next = [0.0f64; 2];
            for to in 0..2 {
                // strict comparison keeps state 0 on ties
                let from = if scores[1] + self.transition[1][to] > scores[0] + self.transition[0][to]
                {
                    1
                } else {
                    0
                };
                next[to] = scores[from] + self.transition[from][to] + self.emission[to][observation];
                backtrack[step][to] = from;
            }
            scores = next;
        }

        // backward pass from the terminal argmax
        let mut state = if scores[1] > scores[0] { 1 } else { 0 };
        let mut path = vec![0usize; steps];
        path[steps - 1] = state;
        for step in (1..steps).rev() {
            state = backtrack[step][state];
            path[step - 1] = state;
        }
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decoder() -> ViterbiDecoder {
        ViterbiDecoder::new(
            [0.80, 0.20],
            [[0.9995, 0.0005], [0.0005, 0.9995]],
            [vec![0.8, 0.2], vec![0.2, 0.8]],
        )
    }

    #[test]
    fn empty_sequence() {
        assert!(decoder().decode(&[]).is_empty());
    }

    #[test]
    fn constant_sequences() {
        assert_eq!(decoder().decode(&[0, 0, 0, 0]), vec![0, 0, 0, 0]);
        assert_eq!(decoder().decode(&[1, 1, 1, 1]), vec![1, 1, 1, 1]);
    }

    #[test]
    fn isolated_glitches_are_smoothed() {
        // sticky transitions: a single flipped observation does not
        // justify two state changes
        let observations = [0, 0, 0, 1, 0, 0, 0];
        assert_eq!(decoder().decode(&observations), vec![0; 7]);

        let observations = [1, 1, 1, 0, 1, 1, 1];
        assert_eq!(decoder().decode(&observations), vec![1; 7]);
    }

    #[test]
    fn long_runs_switch_state() {
        let mut observations = vec![0; 50];
        observations.extend(std::iter::repeat(1).take(50));
        let path = decoder().decode(&observations);
        assert_eq!(&path[..50], &[0; 50]);
        assert_eq!(&path[50..], &[1; 50]);
    }

    #[test]
    fn deterministic() {
        let observations = [0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 0, 0];
        let first = decoder().decode(&observations);
        let second = decoder().decode(&observations);
        assert_eq!(first, second);
    }

    #[test]
    fn ties_prefer_lower_state() {
        // fully symmetric model: every path has the same probability
        let decoder = ViterbiDecoder::new(
            [0.5, 0.5],
            [[0.5, 0.5], [0.5, 0.5]],
            [vec![0.5, 0.5], vec![0.5, 0.5]],
        );
        assert_eq!(decoder.decode(&[0, 1, 0, 1]), vec![0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "outside the emission alphabet")]
    fn out_of_alphabet_observation() {
        decoder().decode(&[0, 2]);
    }
}
