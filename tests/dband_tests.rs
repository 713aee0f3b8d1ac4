// tests/dband_tests.rs
// Banded Gotoh alignment: worked examples, agreement with a naive full-matrix
// reference, encoding equivalence and adaptive driver behaviour.

use ferrous_dband::alignment::utils::encode_sequence;
use ferrous_dband::alignment::{
    align_adaptive, align_in_band, fill_score_only, sentinel_for, AdaptiveTarget, Band,
    DiagonalBandAligner, Eop, Eoplist, GapCosts, Reservoir, ScoreModel, SubstitutionMatrix,
    TraceEncoding,
};
use ferrous_dband::DbandError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ENCODINGS: [TraceEncoding; 2] = [TraceEncoding::FullScores, TraceEncoding::PackedBits];

fn unit_model() -> SubstitutionMatrix {
    SubstitutionMatrix::nucleotide(1, 1, -1).unwrap()
}

fn costs() -> GapCosts {
    GapCosts::new(2, 1).unwrap()
}

/// Plain O(ulen * vlen) Gotoh over the whole matrix, cells outside the band
/// (if any) treated as unreachable.
fn naive_gotoh(
    u: &[u8],
    v: &[u8],
    model: &SubstitutionMatrix,
    costs: &GapCosts,
    band: Option<&Band>,
) -> i64 {
    const NEG: i64 = i64::MIN / 4;
    let (ulen, vlen) = (u.len(), v.len());
    let open = costs.gap_opening() as i64;
    let ext = costs.gap_extension() as i64;
    let mut r = vec![vec![NEG; vlen + 1]; ulen + 1];
    let mut d = r.clone();
    let mut ins = r.clone();
    r[0][0] = 0;
    d[0][0] = -open;
    ins[0][0] = -open;

    for i in 0..=ulen {
        for j in 0..=vlen {
            if (i, j) == (0, 0) {
                continue;
            }
            if let Some(band) = band {
                if !band.contains(i, j) {
                    continue;
                }
            }
            if i > 0 && j > 0 {
                let best = r[i - 1][j - 1].max(d[i - 1][j - 1]).max(ins[i - 1][j - 1]);
                r[i][j] = best + model.substitution(u[i - 1], v[j - 1]) as i64;
            }
            if i > 0 {
                d[i][j] = (r[i - 1][j] - open - ext).max(d[i - 1][j] - ext);
            }
            if j > 0 {
                ins[i][j] = (r[i][j - 1] - open - ext).max(ins[i][j - 1] - ext);
            }
        }
    }
    r[ulen][vlen]
}

fn random_seq(rng: &mut StdRng, len: usize, with_wildcards: bool) -> Vec<u8> {
    (0..len)
        .map(|_| {
            if with_wildcards && rng.gen_range(0..20) == 0 {
                4
            } else {
                rng.gen_range(0..4u8)
            }
        })
        .collect()
}

/// Mutate `seq` with substitutions and short indels so that alignments are
/// interesting rather than random noise.
fn mutate(rng: &mut StdRng, seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len() + 8);
    for &c in seq {
        match rng.gen_range(0..20) {
            0 => {}
            1 => {
                out.push(c);
                out.push(rng.gen_range(0..4u8));
            }
            2 => out.push((c + 1) % 4),
            _ => out.push(c),
        }
    }
    if out.is_empty() {
        out.push(0);
    }
    out
}

fn random_band(rng: &mut StdRng, ulen: usize, vlen: usize) -> Band {
    let lendiff = vlen as i64 - ulen as i64;
    let left = rng.gen_range(-(ulen as i64)..=lendiff.min(0));
    let right = rng.gen_range(lendiff.max(0)..=vlen as i64);
    Band::new(left, right, ulen, vlen).unwrap()
}

fn band_alignment(
    encoding: TraceEncoding,
    model: &SubstitutionMatrix,
    u: &[u8],
    v: &[u8],
    band: &Band,
) -> (i32, Eoplist) {
    let mut reservoir = Reservoir::new(encoding);
    let mut ops = Eoplist::new();
    let score = align_in_band(&mut reservoir, Some(&mut ops), model, &costs(), u, v, band).unwrap();
    (score, ops)
}

#[test]
fn test_deletion_example() {
    let model = unit_model();
    let u = encode_sequence(b"ACGT");
    let v = encode_sequence(b"AGT");
    let band = Band::new(-1, 1, 4, 3).unwrap();
    for encoding in ENCODINGS {
        let (score, ops) = band_alignment(encoding, &model, &u, &v, &band);
        assert_eq!(score, 0, "{:?}", encoding);
        assert_eq!(ops.as_slice(), &[Eop::Match(1), Eop::Deletion, Eop::Match(2)]);
        assert_eq!(ops.to_cigar_string(true), "1=1D2=");
        assert_eq!(ops.to_cigar_string(false), "1M1D2M");
    }
}

#[test]
fn test_identity_example() {
    let model = unit_model();
    let u = encode_sequence(b"ACGTACGT");
    for encoding in ENCODINGS {
        let mut reservoir = Reservoir::new(encoding);
        let mut ops = Eoplist::new();
        let summary = align_adaptive(
            &mut reservoir,
            Some(&mut ops),
            &model,
            &costs(),
            &u,
            &u,
            &AdaptiveTarget::default(),
        )
        .unwrap();
        assert_eq!(summary.score, 8);
        assert_eq!(summary.iterations, 1);
        assert_eq!((summary.left_dist, summary.right_dist), (-1, 1));
        assert_eq!(ops.as_slice(), &[Eop::Match(8)]);
    }
}

#[test]
fn test_random_bands_match_reference() {
    let model = unit_model();
    let g = costs();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..300 {
        let ulen = rng.gen_range(1..=30);
        let u = random_seq(&mut rng, ulen, true);
        let v = if rng.gen_bool(0.5) {
            mutate(&mut rng, &u)
        } else {
            let vlen = rng.gen_range(1..=30);
            random_seq(&mut rng, vlen, true)
        };
        let band = random_band(&mut rng, u.len(), v.len());
        let expected = naive_gotoh(&u, &v, &model, &g, Some(&band));

        let (full_score, full_ops) = band_alignment(TraceEncoding::FullScores, &model, &u, &v, &band);
        let (bits_score, bits_ops) = band_alignment(TraceEncoding::PackedBits, &model, &u, &v, &band);

        assert_eq!(full_score as i64, expected, "u={:?} v={:?} band={:?}", u, v, band);
        assert_eq!(bits_score, full_score);
        assert_eq!(bits_ops, full_ops, "encodings chose different paths");

        assert_eq!(full_ops.aligned_lengths(), (u.len(), v.len()));
        full_ops.verify(&u, &v, &model).unwrap();
        assert_eq!(full_ops.evaluate_score(&u, &v, &model, &g).unwrap(), expected);
        assert!(full_ops.unit_cost() >= u.len().abs_diff(v.len()));
    }
}

#[test]
fn test_wider_band_never_scores_lower() {
    let model = SubstitutionMatrix::nucleotide(2, 3, -1).unwrap();
    let g = GapCosts::new(3, 1).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let mut reservoir = Reservoir::new(TraceEncoding::PackedBits);

    for _ in 0..100 {
        let ulen = rng.gen_range(1..=40);
        let u = random_seq(&mut rng, ulen, false);
        let v = mutate(&mut rng, &u);
        let narrow = random_band(&mut rng, u.len(), v.len());
        let left = rng.gen_range(-(u.len() as i64)..=narrow.left_dist());
        let right = rng.gen_range(narrow.right_dist()..=v.len() as i64);
        let wide = Band::new(left, right, u.len(), v.len()).unwrap();

        let sentinel = sentinel_for(u.len(), v.len(), &model, &g).unwrap();
        let s_narrow = fill_score_only(&mut reservoir, &model, &g, sentinel, &u, &v, &narrow).unwrap();
        let s_wide = fill_score_only(&mut reservoir, &model, &g, sentinel, &u, &v, &wide).unwrap();
        let s_full =
            fill_score_only(&mut reservoir, &model, &g, sentinel, &u, &v, &Band::full(u.len(), v.len()))
                .unwrap();

        assert!(s_narrow <= s_wide);
        assert!(s_wide <= s_full);
        assert_eq!(s_full as i64, naive_gotoh(&u, &v, &model, &g, None));
    }
}

#[test]
fn test_self_alignment_with_zero_match_score() {
    let model = SubstitutionMatrix::nucleotide(0, 1, -1).unwrap();
    let u = encode_sequence(b"GATTACAGATTACA");
    for encoding in ENCODINGS {
        let (score, ops) = band_alignment(encoding, &model, &u, &u, &Band::new(0, 0, 14, 14).unwrap());
        assert_eq!(score, 0);
        assert_eq!(ops.as_slice(), &[Eop::Match(14)]);
        assert_eq!(ops.unit_cost(), 0);
    }
}

#[test]
fn test_wildcards_score_smallest_and_never_match() {
    let model = SubstitutionMatrix::nucleotide(1, 4, -1).unwrap();
    let u = encode_sequence(b"ANA");
    for encoding in ENCODINGS {
        let (score, ops) = band_alignment(encoding, &model, &u, &u, &Band::full(3, 3));
        assert_eq!(score, 1 - 4 + 1);
        assert_eq!(ops.as_slice(), &[Eop::Match(1), Eop::Mismatch, Eop::Match(1)]);
        assert_eq!(ops.to_cigar_string(true), "1=1X1=");
    }
}

#[test]
fn test_precondition_errors() {
    let model = unit_model();
    let g = costs();
    let u = encode_sequence(b"ACGT");
    let v = encode_sequence(b"AGT");
    let mut reservoir = Reservoir::default();

    assert!(matches!(
        Band::new(0, 1, 4, 3),
        Err(DbandError::InvalidBand { .. })
    ));
    assert!(matches!(
        GapCosts::new(0, 1),
        Err(DbandError::InvalidGapPenalty { .. })
    ));
    assert!(matches!(
        fill_score_only(&mut reservoir, &model, &g, i32::MIN, &u, &v, &Band::full(4, 3)),
        Err(DbandError::SentinelOverflow { .. })
    ));
    // Band built for other lengths
    assert!(matches!(
        align_in_band(&mut reservoir, None, &model, &g, &u, &v, &Band::full(3, 3)),
        Err(DbandError::InvalidBand { .. })
    ));
    assert!(matches!(
        align_adaptive(&mut reservoir, None, &model, &g, &u, &[], &AdaptiveTarget::default()),
        Err(DbandError::EmptySequence { other_len: 4 })
    ));
}

#[test]
fn test_both_empty_is_trivial() {
    let model = unit_model();
    let mut reservoir = Reservoir::default();
    let mut ops = Eoplist::from_cigar("3=").unwrap();
    let summary = align_adaptive(
        &mut reservoir,
        Some(&mut ops),
        &model,
        &costs(),
        &[],
        &[],
        &AdaptiveTarget::default(),
    )
    .unwrap();
    assert_eq!(summary.score, 0);
    assert_eq!(summary.iterations, 0);
    assert!(ops.is_empty());
}

#[test]
fn test_driver_widens_until_expected_score() {
    let model = unit_model();
    let g = costs();
    let core = encode_sequence(b"ACGGTCATGCATTGCAGTCCGATAGCTAGG");
    let mut u = encode_sequence(b"TTTTTTTT");
    u.extend_from_slice(&core);
    let mut v = core.clone();
    v.extend_from_slice(&encode_sequence(b"TTTTTTTT"));
    let best = naive_gotoh(&u, &v, &model, &g, None) as i32;

    for encoding in ENCODINGS {
        let mut aligner = DiagonalBandAligner::new(&model, g, encoding);
        let mut ops = Eoplist::new();
        let target = AdaptiveTarget {
            expected_score: Some(best),
            converge: false,
        };
        let summary = aligner.align(&u, &v, &target, Some(&mut ops)).unwrap();
        assert_eq!(summary.score, best);
        assert!(summary.iterations > 1);
        assert!(summary.right_dist - summary.left_dist > 2);
        assert_eq!(
            ops.evaluate_score(&u, &v, &model, &g).unwrap(),
            best as i64
        );
    }
}

#[test]
fn test_driver_converge_and_exhaustion() {
    let model = unit_model();
    let g = costs();
    let u = encode_sequence(b"ACGT");
    let mut reservoir = Reservoir::new(TraceEncoding::PackedBits);

    let reached = AdaptiveTarget {
        expected_score: Some(4),
        converge: false,
    };
    let summary = align_adaptive(&mut reservoir, None, &model, &g, &u, &u, &reached).unwrap();
    assert_eq!((summary.score, summary.iterations), (4, 1));

    let converge = AdaptiveTarget {
        expected_score: Some(100),
        converge: true,
    };
    let summary = align_adaptive(&mut reservoir, None, &model, &g, &u, &u, &converge).unwrap();
    assert_eq!((summary.score, summary.iterations), (4, 2));

    let unreachable = AdaptiveTarget {
        expected_score: Some(100),
        converge: false,
    };
    let mut ops = Eoplist::new();
    match align_adaptive(&mut reservoir, Some(&mut ops), &model, &g, &u, &u, &unreachable) {
        Err(DbandError::BandExhausted { score, expected }) => {
            assert_eq!(score, 4);
            assert_eq!(expected, Some(100));
        }
        other => panic!("expected BandExhausted, got {:?}", other),
    }
}
