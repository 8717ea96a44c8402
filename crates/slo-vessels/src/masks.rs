use sv_core::mask::{ensure_same_dims, subtract, union};
use sv_core::{Error, Image};
use sv_measure::VesselType;

/// The four segmentation maps of one SLO image.
#[derive(Debug, Clone)]
pub struct SegmentationMasks {
    pub binary: Image<u8>,
    pub artery: Image<u8>,
    pub vein: Image<u8>,
    pub disc: Image<u8>,
}

impl SegmentationMasks {
    /// Fails with [`Error::DimensionMismatch`] unless all maps share one size.
    pub fn new(
        binary: Image<u8>,
        artery: Image<u8>,
        vein: Image<u8>,
        disc: Image<u8>,
    ) -> Result<Self, Error> {
        let dims = binary.dims();
        ensure_same_dims("artery map", dims, artery.dims())?;
        ensure_same_dims("vein map", dims, vein.dims())?;
        ensure_same_dims("disc map", dims, disc.dims())?;

        Ok(Self {
            binary,
            artery,
            vein,
            disc,
        })
    }

    /// Splits a three-plane artery/disc/vein map, planes in that order.
    pub fn from_av_disc(binary: Image<u8>, av_disc: &Image<[u8; 3]>) -> Result<Self, Error> {
        let artery = av_disc.map(|p| p[0]);
        let disc = av_disc.map(|p| p[1]);
        let vein = av_disc.map(|p| p[2]);
        Self::new(binary, artery, vein, disc)
    }

    pub fn dims(&self) -> (usize, usize) {
        self.binary.dims()
    }

    /// The map measured for `vessel`.
    ///
    /// The binary map is `(binary ∪ artery ∪ vein) ∖ disc`; artery and vein
    /// maps are used as segmented.
    pub fn vessel_map(&self, vessel: VesselType) -> Result<Image<u8>, Error> {
        match vessel {
            VesselType::Binary => {
                let av = union(&self.artery.as_view(), &self.vein.as_view())?;
                let all = union(&self.binary.as_view(), &av.as_view())?;
                subtract(&all.as_view(), &self.disc.as_view())
            }
            VesselType::Artery => Ok(self.artery.clone()),
            VesselType::Vein => Ok(self.vein.clone()),
        }
    }
}
