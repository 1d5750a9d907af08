pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod geometry;
    pub mod roi;
    pub mod video_metadata;
}

pub mod detection {
    pub mod domain {
        pub mod candidate;
        pub mod tracker_config;
        pub mod tracking_error;
    }
    pub mod infrastructure;
}

pub mod annotation {
    pub mod overlay;
}

pub mod video {
    pub mod domain {
        pub mod display_surface;
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod playback {
    pub mod candidate_cycler;
    pub mod player;
    pub mod session;
}
