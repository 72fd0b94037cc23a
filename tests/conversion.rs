//! End-to-end conversion scenarios

use std::io::Cursor;

use audioconv::audio::wav::HEADER_SIZE;
use audioconv::audio::WavHeader;
use audioconv::{AudioError, ConvertOptions, PcmBuffer, Pipeline, Step};

fn wav_16bit(rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[test]
fn scenario_a_header_derived_fields() {
    let header = WavHeader::new(44100, 2, 16, 0).unwrap();
    assert_eq!(header.byte_rate, 176400);
    assert_eq!(header.block_align, 4);
}

#[test]
fn scenario_b_mono_44k_to_stereo_22k_8bit() {
    let samples: Vec<i16> = (0..44100).map(|i| ((i % 200) as i16 - 100) * 300).collect();
    let input = wav_16bit(44100, 1, &samples);

    let options = ConvertOptions::new()
        .with_sample_rate(22050)
        .with_channels(2)
        .with_bit_depth(8);
    let output = Pipeline::with_builtin()
        .convert_buffer(&input, "wav", "wav", &options)
        .unwrap();

    let header = WavHeader::parse(&output).unwrap();
    assert_eq!(header.sample_rate, 22050);
    assert_eq!(header.num_channels, 2);
    assert_eq!(header.bits_per_sample, 8);
    assert_eq!(header.data_chunk_size, 22050 * 2);
    assert_eq!(output.len() - HEADER_SIZE, 44100);
}

#[test]
fn scenario_c_non_riff_input_never_panics() {
    let pipeline = Pipeline::with_builtin();
    let result = pipeline.convert_buffer(b"RIFX0000WAVEfmt garbage", "wav", "wav", &ConvertOptions::new());
    match result {
        Err(e) => assert_eq!(e.step(), Step::Decode),
        Ok(bytes) => assert!(WavHeader::parse(&bytes).is_ok()),
    }
}

#[test]
fn scenario_d_24_bit_encode_is_rejected() {
    let pipeline = Pipeline::with_builtin();
    let input = wav_16bit(8000, 1, &[0, 1000, -1000, 0]);
    let err: AudioError = pipeline
        .convert_buffer(&input, "wav", "pcm", &ConvertOptions::new().with_bit_depth(24))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.step(), Step::Validate);
}

#[test]
fn hound_reads_our_output() {
    let pcm = PcmBuffer::new(vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25], 48000, 2).unwrap();
    let bytes = Pipeline::with_builtin()
        .registry()
        .get("wav")
        .unwrap()
        .encode(&pcm, &ConvertOptions::new())
        .unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![0, 16384, -16384, 32767, -32768, 8192]);
}

#[test]
fn wav_round_trip_through_every_depth() {
    let pipeline = Pipeline::with_builtin();
    let samples: Vec<i16> = (0..64).map(|i| (i * 997 % 65536 - 32768) as i16).collect();
    let source = wav_16bit(16000, 2, &samples);

    for bits in [8u16, 16, 32] {
        let options = ConvertOptions::new().with_bit_depth(bits);
        let encoded = pipeline.convert_buffer(&source, "wav", "wav", &options).unwrap();
        let header = WavHeader::parse(&encoded).unwrap();
        assert_eq!(header.bits_per_sample, bits);
        assert_eq!(header.sample_rate, 16000);
        assert_eq!(header.num_channels, 2);

        let back = pipeline
            .convert_buffer(&encoded, "wav", "wav", &ConvertOptions::new())
            .unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(back)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();

        let tolerance = if bits == 8 { 260 } else { 1 };
        for (a, b) in samples.iter().zip(&decoded) {
            assert!((*a as i32 - *b as i32).abs() <= tolerance, "{}-bit: {} vs {}", bits, a, b);
        }
    }
}

#[test]
fn metadata_follows_the_preserve_flag() {
    let pcm = PcmBuffer::new(vec![0.0; 4], 8000, 1).unwrap().with_metadata(Some(
        audioconv::AudioMetadata {
            title: Some("Title".into()),
            ..Default::default()
        },
    ));

    let dropped = audioconv::processing::process_pcm(&pcm, &ConvertOptions::new()).unwrap();
    assert!(dropped.metadata().is_none());

    let kept = audioconv::processing::process_pcm(
        &pcm,
        &ConvertOptions::new().with_preserve_metadata(true),
    )
    .unwrap();
    assert_eq!(kept.metadata(), pcm.metadata());
}
